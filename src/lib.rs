//! Command/handler activation core for an IDE-style workbench
//!
//! Decides, at any instant, which single handler implementation should
//! respond to a user-invoked command given the currently active shell,
//! window and part site, a pool of competing handler submissions, and a
//! tree of nested per-site binding services.
//!
//! The moving parts:
//! - [`submission::Submission`]: a command or context id paired with an
//!   activation scope (and, for handlers, a priority and implementation).
//! - [`support::CommandSupport`]: the arbitrator; resolves one winner per
//!   command id and replaces the registry wholesale each pass.
//! - [`registry::HandlerRegistry`]: the command id → handler map and the
//!   enabled context-id set that dispatch reads.
//! - [`nested::ServiceTree`]: nested binding services, one per part site,
//!   merged into the root pool while active.
//! - [`focus::FocusTracker`]: turns focus events into resolution passes.
//! - [`workbench::Workbench`]: the per-process context object tying it all
//!   together.

pub mod config;
pub mod diagnostics;
pub mod focus;
pub mod handler;
pub mod nested;
pub mod registry;
pub mod scope;
pub mod submission;
pub mod support;
pub mod workbench;

pub use config::{load_debug_options, DebugOptions};
pub use diagnostics::{DiagnosticSink, RecordingSink, TracingSink};
pub use focus::FocusEvent;
pub use handler::{Action, ActionHandler, ActionOrigin, Handler};
pub use nested::NodeId;
pub use scope::{ActiveScope, Priority, ShellId, SiteId, WindowId};
pub use submission::{EnabledSubmission, HandlerSubmission, Submission, SubmissionScope};
pub use workbench::Workbench;
