//! Submission value objects
//!
//! A submission binds a command or context id to an activation scope. The
//! two roles (installing a handler vs. enabling a context) share the scope
//! fields but are distinct cases of [`Submission`]; the arbitrator never has
//! to type-check a shared mutable shape.

use std::fmt;
use std::rc::Rc;

use crate::handler::Handler;
use crate::scope::{Priority, ShellId, SiteId, WindowId};

/// Optional scope restrictions carried by every submission.
///
/// `None` in a field is a wildcard: the submission matches whatever is
/// active there. A submission with all fields `None` is global.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionScope {
    pub site: Option<SiteId>,
    pub shell: Option<ShellId>,
    pub window: Option<WindowId>,
}

/// A registration binding a command id to a handler implementation.
pub struct HandlerSubmission {
    pub scope: SubmissionScope,
    pub command_id: String,
    pub priority: Priority,
    pub handler: Rc<dyn Handler>,
}

impl HandlerSubmission {
    pub fn new(
        scope: SubmissionScope,
        command_id: impl Into<String>,
        priority: Priority,
        handler: Rc<dyn Handler>,
    ) -> Rc<Self> {
        Rc::new(Self {
            scope,
            command_id: command_id.into(),
            priority,
            handler,
        })
    }

    /// Fresh submission equal to this one but owned by `site`.
    fn with_site(&self, site: SiteId) -> Rc<Self> {
        Rc::new(Self {
            scope: SubmissionScope {
                site: Some(site),
                ..self.scope
            },
            command_id: self.command_id.clone(),
            priority: self.priority,
            handler: Rc::clone(&self.handler),
        })
    }
}

impl fmt::Debug for HandlerSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSubmission")
            .field("scope", &self.scope)
            .field("command_id", &self.command_id)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A registration enabling a context id within a scope.
#[derive(Debug)]
pub struct EnabledSubmission {
    pub scope: SubmissionScope,
    pub context_id: String,
}

impl EnabledSubmission {
    pub fn new(scope: SubmissionScope, context_id: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            scope,
            context_id: context_id.into(),
        })
    }

    fn with_site(&self, site: SiteId) -> Rc<Self> {
        Rc::new(Self {
            scope: SubmissionScope {
                site: Some(site),
                ..self.scope
            },
            context_id: self.context_id.clone(),
        })
    }
}

/// Either kind of submission. Removal matches by `Rc` pointer identity.
#[derive(Debug, Clone)]
pub enum Submission {
    Handler(Rc<HandlerSubmission>),
    Enabled(Rc<EnabledSubmission>),
}

impl Submission {
    pub fn scope(&self) -> SubmissionScope {
        match self {
            Submission::Handler(s) => s.scope,
            Submission::Enabled(s) => s.scope,
        }
    }

    /// Site normalization for merging: rewrite the owning site to `site`
    /// unless it already matches, preserving every other field. Keeps the
    /// arbitrator's site-equality filter correct no matter which nested
    /// service originally created the submission.
    pub(crate) fn normalized_to(&self, site: SiteId) -> Submission {
        match self {
            Submission::Handler(s) if s.scope.site != Some(site) => {
                Submission::Handler(s.with_site(site))
            }
            Submission::Enabled(s) if s.scope.site != Some(site) => {
                Submission::Enabled(s.with_site(site))
            }
            other => other.clone(),
        }
    }
}
