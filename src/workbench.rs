//! The workbench context object
//!
//! Owns the arbitrator, the registry, the nested service tree and the focus
//! tracker, and hands out scope ids. One instance per workbench; created at
//! startup and disposed at shutdown. Everything the embedding shell calls
//! goes through here.

use std::collections::HashSet;
use std::rc::Rc;

use crate::config::DebugOptions;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::focus::{FocusEvent, FocusTracker};
use crate::handler::Action;
use crate::nested::{NodeId, ServiceTree};
use crate::registry::HandlerRegistry;
use crate::scope::{ShellId, SiteId, WindowId};
use crate::submission::Submission;
use crate::support::CommandSupport;

pub struct Workbench {
    support: CommandSupport,
    tree: ServiceTree,
    focus: FocusTracker,
    next_site: u32,
    next_shell: u32,
    next_window: u32,
    disposed: bool,
}

impl Workbench {
    pub fn new() -> Self {
        Self::with_options(DebugOptions::default(), Rc::new(TracingSink))
    }

    pub fn with_options(options: DebugOptions, sink: Rc<dyn DiagnosticSink>) -> Self {
        // Site 0 belongs to the workbench-level root service.
        let root_site = SiteId(0);
        Self {
            support: CommandSupport::new(options, sink),
            tree: ServiceTree::new(root_site),
            focus: FocusTracker::new(),
            next_site: 1,
            next_shell: 0,
            next_window: 0,
            disposed: false,
        }
    }

    /// The workbench-level binding service, parent of all nested services.
    pub fn root_service(&self) -> NodeId {
        self.tree.root()
    }

    /// The site owned by the root service. Submissions made through the
    /// root (actions, scopes) are scoped to it.
    pub fn root_site(&self) -> SiteId {
        self.tree.site(self.tree.root())
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.support.registry()
    }

    /// Allocate a site handle for a new part.
    pub fn create_site(&mut self) -> SiteId {
        let id = SiteId(self.next_site);
        self.next_site += 1;
        id
    }

    pub fn create_shell(&mut self) -> ShellId {
        let id = ShellId(self.next_shell);
        self.next_shell += 1;
        id
    }

    pub fn create_window(&mut self) -> WindowId {
        let id = WindowId(self.next_window);
        self.next_window += 1;
        id
    }

    /// Add a batch of submissions to the pool. Atomic with respect to
    /// resolution: the pass that follows sees the whole batch.
    pub fn add_submissions(&mut self, batch: &[Submission]) {
        if self.disposed {
            return;
        }
        self.support.add_submissions(batch);
    }

    /// Remove a batch of submissions (matched by identity).
    pub fn remove_submissions(&mut self, batch: &[Submission]) {
        if self.disposed {
            return;
        }
        self.support.remove_submissions(batch);
    }

    /// Memoized nested-service lookup under `node` for `site`. `None` if
    /// `node` has been disposed.
    pub fn get_or_create_nested(&mut self, node: NodeId, site: SiteId) -> Option<NodeId> {
        if self.disposed {
            return None;
        }
        self.tree.get_or_create(node, site)
    }

    /// Activate the nested service for `site` (deactivating any other);
    /// `None` deactivates. Returns whether anything changed.
    pub fn activate_nested(&mut self, node: NodeId, site: Option<SiteId>) -> bool {
        if self.disposed {
            return false;
        }
        self.tree.activate(node, site, &mut self.support)
    }

    pub fn deactivate_nested(&mut self, node: NodeId) -> bool {
        self.activate_nested(node, None)
    }

    /// Forget the nested service for `site`. `false` if it never existed.
    pub fn remove_nested(&mut self, node: NodeId, site: SiteId) -> bool {
        if self.disposed {
            return false;
        }
        self.tree.remove(node, site, &mut self.support)
    }

    /// Context ids enabled on `node`, unioned with its active chain.
    pub fn get_scopes(&self, node: NodeId) -> HashSet<String> {
        self.tree.scopes(node)
    }

    pub fn set_scopes(&mut self, node: NodeId, scopes: &[&str]) {
        if self.disposed {
            return;
        }
        self.tree.set_scopes(node, scopes, &mut self.support);
    }

    pub fn register_action(&mut self, node: NodeId, action: Rc<dyn Action>) {
        if self.disposed {
            return;
        }
        self.tree.register_action(node, action, &mut self.support);
    }

    pub fn unregister_action(&mut self, node: NodeId, action: &dyn Action) {
        if self.disposed {
            return;
        }
        self.tree.unregister_action(node, action, &mut self.support);
    }

    /// Deliver a focus event; resolution runs before this returns.
    pub fn post(&mut self, event: FocusEvent) {
        if self.disposed {
            return;
        }
        self.focus.post(event, &mut self.support);
    }

    /// Trigger a resolution pass. `force` bypasses the did-anything-change
    /// short-circuit.
    pub fn resolve(&mut self, force: bool) {
        if self.disposed {
            return;
        }
        self.support.reresolve(self.focus.active_scope(), force);
    }

    /// Tear down the whole workbench: dispose the service tree (releasing
    /// owned handlers), then clear the pool and registry. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let root = self.tree.root();
        self.tree.dispose(root, &mut self.support);
        self.support.clear();
        self.disposed = true;
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new()
    }
}
