//! Nested binding services
//!
//! Each part site can obtain a private, independently disposable view of
//! command/context activation. A node's submissions reach the root pool only
//! while the node is the active descendant of its whole ancestor chain; the
//! merge rewrites owning sites so the arbitrator's site filter stays correct.
//!
//! Nodes live in an arena (`Vec` indexed by [`NodeId`]) with parent indices
//! instead of back-pointers, so the tree has no ownership cycles.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::handler::{Action, ActionHandler, ActionOrigin, Handler};
use crate::scope::{Priority, SiteId};
use crate::submission::{EnabledSubmission, HandlerSubmission, Submission, SubmissionScope};
use crate::support::CommandSupport;

/// Index of a service node within its [`ServiceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

struct ServiceNode {
    site: SiteId,
    parent: Option<NodeId>,
    children: HashMap<SiteId, NodeId>,
    active_child: Option<NodeId>,
    /// Action-bridge submissions, one per command id; replaced on
    /// re-registration. All handlers in here are owned wrappers.
    handler_submissions: HashMap<String, Rc<HandlerSubmission>>,
    enabled_submissions: Vec<Rc<EnabledSubmission>>,
    enabled_context_ids: HashSet<String>,
    /// Root node only: the normalized copies currently merged into the pool
    /// on behalf of the active child chain.
    merged: Vec<Submission>,
    disposed: bool,
}

impl ServiceNode {
    fn new(site: SiteId, parent: Option<NodeId>) -> Self {
        Self {
            site,
            parent,
            children: HashMap::new(),
            active_child: None,
            handler_submissions: HashMap::new(),
            enabled_submissions: Vec::new(),
            enabled_context_ids: HashSet::new(),
            merged: Vec::new(),
            disposed: false,
        }
    }

    fn own_submissions(&self) -> Vec<Submission> {
        let mut submissions: Vec<Submission> = self
            .enabled_submissions
            .iter()
            .map(|s| Submission::Enabled(Rc::clone(s)))
            .collect();
        submissions.extend(
            self.handler_submissions
                .values()
                .map(|s| Submission::Handler(Rc::clone(s))),
        );
        submissions
    }
}

pub struct ServiceTree {
    nodes: Vec<ServiceNode>,
    root: NodeId,
}

impl ServiceTree {
    pub(crate) fn new(root_site: SiteId) -> Self {
        Self {
            nodes: vec![ServiceNode::new(root_site, None)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The site a node was created for.
    pub(crate) fn site(&self, node: NodeId) -> SiteId {
        self.node(node).site
    }

    fn node(&self, id: NodeId) -> &ServiceNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ServiceNode {
        &mut self.nodes[id.0]
    }

    /// Memoized child lookup: repeated requests for the same site return
    /// the same node. Created lazily as inactive. `None` if `node` has been
    /// disposed.
    pub(crate) fn get_or_create(&mut self, node: NodeId, site: SiteId) -> Option<NodeId> {
        if self.node(node).disposed {
            return None;
        }
        if let Some(&existing) = self.node(node).children.get(&site) {
            return Some(existing);
        }
        let child = NodeId(self.nodes.len());
        self.nodes.push(ServiceNode::new(site, Some(node)));
        self.node_mut(node).children.insert(site, child);
        Some(child)
    }

    /// Activate the child registered for `site`, deactivating whichever
    /// child was active before. `site == None` is a plain deactivation.
    /// Returns whether anything changed.
    pub(crate) fn activate(
        &mut self,
        node: NodeId,
        site: Option<SiteId>,
        support: &mut CommandSupport,
    ) -> bool {
        if self.node(node).disposed {
            return false;
        }

        let Some(site) = site else {
            if self.node(node).active_child.is_none() {
                return false;
            }
            self.deactivate_nested(node, support);
            return true;
        };

        let child = self.node(node).children.get(&site).copied();
        if child == self.node(node).active_child {
            return false;
        }

        self.deactivate_nested(node, support);
        if child.is_some() {
            self.activate_nested(node, child, support);
        }
        true
    }

    /// Install `child` as the active nested service, propagating the merged
    /// submission set to the root pool.
    fn activate_nested(
        &mut self,
        node: NodeId,
        child: Option<NodeId>,
        support: &mut CommandSupport,
    ) {
        if self.node(node).disposed {
            return;
        }

        // If this node is itself merged somewhere up the chain, detach it
        // first so the merged set can change underneath.
        let parent = self.node(node).parent;
        let was_active =
            parent.is_some_and(|p| self.node(p).active_child == Some(node));
        if let Some(p) = parent {
            if was_active {
                self.deactivate_nested(p, support);
            }
        }

        self.node_mut(node).active_child = child;

        let Some(child) = child else {
            return;
        };

        match parent {
            Some(p) => {
                if was_active {
                    // Re-assert myself: the parent re-merges my (now larger)
                    // flattened set all the way to the root.
                    self.activate_nested(p, Some(node), support);
                }
            }
            None => {
                let site = self.node(node).site;
                let merged: Vec<Submission> = self
                    .flattened_submissions(child)
                    .iter()
                    .map(|s| s.normalized_to(site))
                    .collect();
                support.add_submissions(&merged);
                self.node_mut(node).merged = merged;
            }
        }
    }

    /// Clear the active nested service, removing its merged submissions
    /// from wherever they went.
    fn deactivate_nested(&mut self, node: NodeId, support: &mut CommandSupport) {
        if self.node(node).disposed || self.node(node).active_child.is_none() {
            return;
        }

        let parent = self.node(node).parent;
        let was_active =
            parent.is_some_and(|p| self.node(p).active_child == Some(node));
        match parent {
            Some(p) => {
                if was_active {
                    self.deactivate_nested(p, support);
                }
            }
            None => {
                let merged = std::mem::take(&mut self.node_mut(node).merged);
                // Handlers in the merged set belong to the nested services
                // that created them; removal must not dispose them.
                support.remove_submissions(&merged);
            }
        }

        self.node_mut(node).active_child = None;

        if was_active {
            if let Some(p) = parent {
                self.activate_nested(p, Some(node), support);
            }
        }
    }

    /// The node's own submissions plus, recursively, its active chain's.
    fn flattened_submissions(&self, node: NodeId) -> Vec<Submission> {
        if self.node(node).disposed {
            return Vec::new();
        }
        let mut submissions = self.node(node).own_submissions();
        if let Some(child) = self.node(node).active_child {
            submissions.extend(self.flattened_submissions(child));
        }
        submissions
    }

    /// Forget the child registered for `site`. Returns `false` if no such
    /// child exists. Deactivates it first if it was active; its slot stays
    /// in the arena but is no longer reachable.
    pub(crate) fn remove(
        &mut self,
        node: NodeId,
        site: SiteId,
        support: &mut CommandSupport,
    ) -> bool {
        if self.node(node).disposed {
            return false;
        }
        let Some(child) = self.node_mut(node).children.remove(&site) else {
            return false;
        };
        if self.node(node).active_child == Some(child) {
            self.deactivate_nested(node, support);
        }
        true
    }

    /// Union of this node's enabled context ids and, if a child is active,
    /// the child's aggregated scopes.
    pub(crate) fn scopes(&self, node: NodeId) -> HashSet<String> {
        if self.node(node).disposed {
            return HashSet::new();
        }
        let mut scopes = self.node(node).enabled_context_ids.clone();
        if let Some(child) = self.node(node).active_child {
            scopes.extend(self.scopes(child));
        }
        scopes
    }

    /// Replace the node's enabled context ids with `scopes`, re-submitting
    /// the corresponding enable submissions.
    pub(crate) fn set_scopes(
        &mut self,
        node: NodeId,
        scopes: &[&str],
        support: &mut CommandSupport,
    ) {
        if self.node(node).disposed {
            return;
        }

        let (parent, was_active) = self.detach_for_update(node, support);
        if parent.is_none() {
            let previous: Vec<Submission> = self
                .node(node)
                .enabled_submissions
                .iter()
                .map(|s| Submission::Enabled(Rc::clone(s)))
                .collect();
            support.remove_submissions(&previous);
        }

        let site = self.node(node).site;
        let ids: HashSet<String> = scopes.iter().map(|s| s.to_string()).collect();
        let submissions: Vec<Rc<EnabledSubmission>> = ids
            .iter()
            .map(|id| {
                EnabledSubmission::new(
                    SubmissionScope {
                        site: Some(site),
                        ..SubmissionScope::default()
                    },
                    id.clone(),
                )
            })
            .collect();
        {
            let n = self.node_mut(node);
            n.enabled_context_ids = ids;
            n.enabled_submissions = submissions;
        }

        self.reattach_or_submit(node, parent, was_active, support, |n| {
            n.enabled_submissions
                .iter()
                .map(|s| Submission::Enabled(Rc::clone(s)))
                .collect()
        });
    }

    /// Wrap `action` into an owned handler submission for its command id,
    /// replacing any prior submission for that id. Values that already wrap
    /// the opposite direction of the bridge are rejected outright.
    pub(crate) fn register_action(
        &mut self,
        node: NodeId,
        action: Rc<dyn Action>,
        support: &mut CommandSupport,
    ) {
        if self.node(node).disposed {
            return;
        }
        match action.origin() {
            ActionOrigin::WrapsHandler => {
                tracing::warn!("cannot register a handler-wrapping action back into the system");
                return;
            }
            ActionOrigin::FromCommand => {
                tracing::debug!("ignoring registration of a command-derived action");
                return;
            }
            ActionOrigin::Native => {}
        }

        self.unregister_action(node, action.as_ref(), support);

        let Some(command_id) = action.command_id().map(str::to_string) else {
            return;
        };

        let (parent, was_active) = self.detach_for_update(node, support);

        let handler: Rc<dyn Handler> = ActionHandler::new(action);
        let site = self.node(node).site;
        let submission = HandlerSubmission::new(
            SubmissionScope {
                site: Some(site),
                ..SubmissionScope::default()
            },
            command_id.clone(),
            Priority::Medium,
            handler,
        );
        self.node_mut(node)
            .handler_submissions
            .insert(command_id, Rc::clone(&submission));

        self.reattach_or_submit(node, parent, was_active, support, move |_| {
            vec![Submission::Handler(Rc::clone(&submission))]
        });
    }

    /// Remove the submission bridged from `action` and dispose its wrapper.
    pub(crate) fn unregister_action(
        &mut self,
        node: NodeId,
        action: &dyn Action,
        support: &mut CommandSupport,
    ) {
        if self.node(node).disposed {
            return;
        }
        if action.origin() == ActionOrigin::WrapsHandler {
            tracing::warn!("cannot unregister a handler-wrapping action out of the system");
            return;
        }

        let Some(command_id) = action.command_id() else {
            return;
        };
        if !self.node(node).handler_submissions.contains_key(command_id) {
            return;
        }

        let (parent, was_active) = self.detach_for_update(node, support);

        let removed = self.node_mut(node).handler_submissions.remove(command_id);

        match parent {
            Some(p) => {
                if was_active {
                    self.activate_nested(p, Some(node), support);
                }
            }
            None => {
                if let Some(submission) = &removed {
                    support.remove_submissions(&[Submission::Handler(Rc::clone(submission))]);
                }
            }
        }
        // The wrapper was created by this node, so release it here.
        if let Some(submission) = removed {
            submission.handler.dispose();
        }
    }

    /// Tear down the node: deactivate, drop out of any ancestor-merged
    /// view, dispose owned handler wrappers exactly once, cascade into all
    /// descendants. Idempotent.
    pub(crate) fn dispose(&mut self, node: NodeId, support: &mut CommandSupport) {
        if self.node(node).disposed {
            return;
        }

        // Leave the parent's merged view before tearing anything down.
        if let Some(p) = self.node(node).parent {
            if !self.node(p).disposed && self.node(p).active_child == Some(node) {
                self.deactivate_nested(p, support);
            }
        }
        self.deactivate_nested(node, support);
        self.node_mut(node).disposed = true;

        // Root-level submissions went into the pool directly.
        if self.node(node).parent.is_none() {
            let own = self.node(node).own_submissions();
            support.remove_submissions(&own);
        }

        for submission in self.node(node).handler_submissions.values() {
            submission.handler.dispose();
        }

        let children: Vec<NodeId> = self.node(node).children.values().copied().collect();
        for child in children {
            self.dispose(child, support);
        }

        let n = self.node_mut(node);
        n.handler_submissions.clear();
        n.enabled_submissions.clear();
        n.enabled_context_ids.clear();
        n.children.clear();
        n.merged.clear();
    }

    /// If this node is currently its parent's active child, pull it out of
    /// the merged view so local submissions can change. Returns the parent
    /// and whether a re-attach is owed.
    fn detach_for_update(
        &mut self,
        node: NodeId,
        support: &mut CommandSupport,
    ) -> (Option<NodeId>, bool) {
        let parent = self.node(node).parent;
        let was_active =
            parent.is_some_and(|p| self.node(p).active_child == Some(node));
        if let Some(p) = parent {
            if was_active {
                self.deactivate_nested(p, support);
            }
        }
        (parent, was_active)
    }

    /// Counterpart of `detach_for_update`: nested nodes re-assert
    /// themselves in the parent; the root submits `fresh_submissions`
    /// straight into the pool.
    fn reattach_or_submit(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        was_active: bool,
        support: &mut CommandSupport,
        fresh_submissions: impl FnOnce(&ServiceNode) -> Vec<Submission>,
    ) {
        match parent {
            Some(p) => {
                if was_active {
                    self.activate_nested(p, Some(node), support);
                }
            }
            None => {
                let batch = fresh_submissions(self.node(node));
                support.add_submissions(&batch);
            }
        }
    }
}
