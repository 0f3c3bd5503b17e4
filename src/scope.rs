//! Scope handles and the active-scope tuple
//!
//! Sites, shells and windows are opaque ids handed out by the `Workbench`.
//! Their derived ordering is the registration order, which doubles as the
//! implementation-defined tie-break used when two submissions carry distinct
//! non-wildcard values for the same scope field.

/// Identifies one part site (e.g. a single editor or view instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub(crate) u32);

/// Identifies a top-level shell (OS window frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShellId(pub(crate) u32);

/// Identifies a workbench window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) u32);

/// Rank used as the final tie-break between handler submissions with equal
/// scope specificity. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// The scope tuple the arbitrator resolves against.
///
/// `None` in a field means "nothing is active there". Page and perspective
/// changes re-trigger resolution but carry no value of their own, so they do
/// not appear here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveScope {
    pub shell: Option<ShellId>,
    pub window: Option<WindowId>,
    pub site: Option<SiteId>,
}
