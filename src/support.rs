//! Command support: the submission pool and the resolution pass
//!
//! For every command id with at least one submission, the pass selects the
//! single handler that best matches the active scope, detects unresolved
//! ties, and replaces the registry's views wholesale. Context-enable
//! submissions resolve in the same pass.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::config::DebugOptions;
use crate::diagnostics::DiagnosticSink;
use crate::handler::Handler;
use crate::registry::HandlerRegistry;
use crate::scope::ActiveScope;
use crate::submission::{EnabledSubmission, HandlerSubmission, Submission, SubmissionScope};

pub struct CommandSupport {
    handler_submissions: HashMap<String, Vec<Rc<HandlerSubmission>>>,
    enabled_submissions: Vec<Rc<EnabledSubmission>>,
    /// Scope the registry was last resolved against.
    active: ActiveScope,
    registry: HandlerRegistry,
    options: DebugOptions,
    sink: Rc<dyn DiagnosticSink>,
}

impl CommandSupport {
    pub(crate) fn new(options: DebugOptions, sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            handler_submissions: HashMap::new(),
            enabled_submissions: Vec::new(),
            active: ActiveScope::default(),
            registry: HandlerRegistry::new(),
            options,
            sink,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Add a batch of submissions and re-resolve once. The batch is fully
    /// applied before the pass runs.
    pub(crate) fn add_submissions(&mut self, batch: &[Submission]) {
        for submission in batch {
            match submission {
                Submission::Handler(s) => {
                    self.handler_submissions
                        .entry(s.command_id.clone())
                        .or_default()
                        .push(Rc::clone(s));
                }
                Submission::Enabled(s) => {
                    self.enabled_submissions.push(Rc::clone(s));
                }
            }
        }
        self.run_pass();
    }

    /// Remove a batch of submissions by pointer identity and re-resolve
    /// once. Handlers are not disposed here; disposal belongs to whoever
    /// created them.
    pub(crate) fn remove_submissions(&mut self, batch: &[Submission]) {
        for submission in batch {
            match submission {
                Submission::Handler(s) => {
                    if let Some(list) = self.handler_submissions.get_mut(&s.command_id) {
                        list.retain(|existing| !Rc::ptr_eq(existing, s));
                        if list.is_empty() {
                            self.handler_submissions.remove(&s.command_id);
                        }
                    }
                }
                Submission::Enabled(s) => {
                    self.enabled_submissions
                        .retain(|existing| !Rc::ptr_eq(existing, s));
                }
            }
        }
        self.run_pass();
    }

    /// Re-resolve against a (possibly unchanged) scope. A non-forced call
    /// short-circuits when nothing observable changed.
    pub(crate) fn reresolve(&mut self, scope: ActiveScope, force: bool) {
        if !force && self.active == scope {
            return;
        }
        self.active = scope;
        self.run_pass();
    }

    pub(crate) fn clear(&mut self) {
        self.handler_submissions.clear();
        self.enabled_submissions.clear();
        self.registry.clear();
    }

    /// Does the submission's scope match the active tuple? `None` fields
    /// are wildcards; a submission with no site must never be excluded by
    /// site comparison.
    fn matches(&self, scope: SubmissionScope) -> bool {
        let site_ok = scope.site.is_none_or(|s| self.active.site == Some(s));
        let window_ok = scope.window.is_none_or(|w| self.active.window == Some(w));
        let shell_ok = scope.shell.is_none_or(|s| self.active.shell == Some(s));
        site_ok && window_ok && shell_ok
    }

    /// The full recomputation: one winner (or a conflict) per command id,
    /// then both registry views replaced in one step.
    fn run_pass(&mut self) {
        let mut winners: HashMap<String, Rc<dyn Handler>> = HashMap::new();

        for (command_id, submissions) in &self.handler_submissions {
            let mut best: Option<&Rc<HandlerSubmission>> = None;
            let mut conflict = false;

            for submission in submissions {
                if !self.matches(submission.scope) {
                    continue;
                }

                let Some(current) = best else {
                    best = Some(submission);
                    continue;
                };

                match compare_submissions(submission, current) {
                    Ordering::Greater => {
                        if self.options.trace_resolved(command_id) {
                            self.sink.message(&format!(
                                "resolved handler conflict for command '{command_id}': \
                                 {submission:?} supersedes {current:?}"
                            ));
                        }
                        conflict = false;
                        best = Some(submission);
                    }
                    Ordering::Equal if !Rc::ptr_eq(&submission.handler, &current.handler) => {
                        if self.options.report_conflicts {
                            self.sink.message(&format!(
                                "unresolved handler conflict for command '{command_id}'"
                            ));
                        }
                        conflict = true;
                    }
                    _ => {
                        if self.options.trace_resolved(command_id) {
                            self.sink.message(&format!(
                                "resolved handler conflict for command '{command_id}': \
                                 kept {current:?}"
                            ));
                        }
                    }
                }
            }

            if let Some(best) = best {
                if !conflict {
                    winners.insert(command_id.clone(), Rc::clone(&best.handler));
                }
            }
        }

        let contexts: HashSet<String> = self
            .enabled_submissions
            .iter()
            .filter(|s| self.matches(s.scope))
            .map(|s| s.context_id.clone())
            .collect();

        self.registry.install_handlers(winners);
        self.registry.install_contexts(contexts);
    }
}

/// Strict specificity order between two submissions for the same command:
/// site, then window, then shell, then declared priority. A non-wildcard
/// value beats a wildcard; two distinct non-wildcard values order by the
/// ids' allocation order.
fn compare_submissions(a: &HandlerSubmission, b: &HandlerSubmission) -> Ordering {
    compare_field(a.scope.site, b.scope.site)
        .then_with(|| compare_field(a.scope.window, b.scope.window))
        .then_with(|| compare_field(a.scope.shell, b.scope.shell))
        .then_with(|| a.priority.cmp(&b.priority))
}

fn compare_field<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::scope::{Priority, ShellId, SiteId};

    struct NullHandler;

    impl Handler for NullHandler {
        fn execute(&self) {}
    }

    fn handler() -> Rc<dyn Handler> {
        Rc::new(NullHandler)
    }

    fn support_with_sink() -> (CommandSupport, Rc<RecordingSink>) {
        let sink = Rc::new(RecordingSink::new());
        let support = CommandSupport::new(DebugOptions::default(), sink.clone());
        (support, sink)
    }

    fn submit(
        support: &mut CommandSupport,
        command_id: &str,
        scope: SubmissionScope,
        priority: Priority,
        handler: Rc<dyn Handler>,
    ) -> Submission {
        let submission =
            Submission::Handler(HandlerSubmission::new(scope, command_id, priority, handler));
        support.add_submissions(std::slice::from_ref(&submission));
        submission
    }

    #[test]
    fn test_global_submission_wins_alone() {
        let (mut support, _sink) = support_with_sink();
        let h = handler();
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope::default(),
            Priority::Medium,
            h.clone(),
        );

        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &h));
    }

    #[test]
    fn test_site_specificity_beats_priority() {
        let (mut support, _sink) = support_with_sink();
        let site = SiteId(0);
        support.reresolve(
            ActiveScope {
                site: Some(site),
                ..ActiveScope::default()
            },
            false,
        );

        let site_scoped = handler();
        let global = handler();
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope {
                site: Some(site),
                ..SubmissionScope::default()
            },
            Priority::Low,
            site_scoped.clone(),
        );
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope::default(),
            Priority::Medium,
            global.clone(),
        );

        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &site_scoped));

        // Active site goes away: the global, higher-priority one takes over.
        support.reresolve(ActiveScope::default(), false);
        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &global));
    }

    #[test]
    fn test_mismatched_site_is_filtered_out() {
        let (mut support, _sink) = support_with_sink();
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope {
                site: Some(SiteId(5)),
                ..SubmissionScope::default()
            },
            Priority::High,
            handler(),
        );

        // No active site at all: the submission does not match.
        assert!(support.registry().handler_for("edit.copy").is_none());
    }

    #[test]
    fn test_equal_specificity_conflict_installs_nothing() {
        let (mut support, sink) = support_with_sink();
        submit(
            &mut support,
            "edit.paste",
            SubmissionScope::default(),
            Priority::Medium,
            handler(),
        );
        sink.take();
        submit(
            &mut support,
            "edit.paste",
            SubmissionScope::default(),
            Priority::Medium,
            handler(),
        );

        assert!(support.registry().handler_for("edit.paste").is_none());
        let messages = sink.take();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("unresolved handler conflict"));
        assert!(messages[0].contains("edit.paste"));
    }

    #[test]
    fn test_same_instance_twice_is_not_a_conflict() {
        let (mut support, sink) = support_with_sink();
        let shared = handler();
        let batch = vec![
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.cut",
                Priority::Medium,
                shared.clone(),
            )),
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.cut",
                Priority::Medium,
                shared.clone(),
            )),
        ];
        support.add_submissions(&batch);

        let installed = support.registry().handler_for("edit.cut").unwrap();
        assert!(Rc::ptr_eq(&installed, &shared));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_higher_priority_resolves_tie() {
        let (mut support, sink) = support_with_sink();
        let low = handler();
        let high = handler();
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope::default(),
            Priority::Low,
            low,
        );
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope::default(),
            Priority::High,
            high.clone(),
        );

        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &high));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_later_better_submission_clears_conflict() {
        let (mut support, _sink) = support_with_sink();
        let best = handler();
        let batch = vec![
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.copy",
                Priority::Medium,
                handler(),
            )),
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.copy",
                Priority::Medium,
                handler(),
            )),
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.copy",
                Priority::High,
                best.clone(),
            )),
        ];
        support.add_submissions(&batch);

        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &best));
    }

    #[test]
    fn test_removal_reinstates_previous_winner() {
        let (mut support, _sink) = support_with_sink();
        let low = handler();
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope::default(),
            Priority::Low,
            low.clone(),
        );
        let high = submit(
            &mut support,
            "edit.copy",
            SubmissionScope::default(),
            Priority::High,
            handler(),
        );

        support.remove_submissions(std::slice::from_ref(&high));
        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &low));
    }

    #[test]
    fn test_nonforced_reresolve_short_circuits() {
        let (mut support, sink) = support_with_sink();
        // Two tied submissions: every real pass emits one conflict message.
        let batch = vec![
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.paste",
                Priority::Medium,
                handler(),
            )),
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.paste",
                Priority::Medium,
                handler(),
            )),
        ];
        support.add_submissions(&batch);
        assert_eq!(sink.take().len(), 1);

        support.reresolve(ActiveScope::default(), false);
        support.reresolve(ActiveScope::default(), false);
        assert!(sink.is_empty());

        support.reresolve(ActiveScope::default(), true);
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn test_shell_scoped_submission_follows_shell() {
        let (mut support, _sink) = support_with_sink();
        let shell = ShellId(0);
        let scoped = handler();
        submit(
            &mut support,
            "edit.copy",
            SubmissionScope {
                shell: Some(shell),
                ..SubmissionScope::default()
            },
            Priority::Medium,
            scoped.clone(),
        );
        assert!(support.registry().handler_for("edit.copy").is_none());

        support.reresolve(
            ActiveScope {
                shell: Some(shell),
                ..ActiveScope::default()
            },
            false,
        );
        let installed = support.registry().handler_for("edit.copy").unwrap();
        assert!(Rc::ptr_eq(&installed, &scoped));
    }

    #[test]
    fn test_context_enablement_follows_scope() {
        let (mut support, _sink) = support_with_sink();
        let site = SiteId(1);
        let batch = vec![
            Submission::Enabled(EnabledSubmission::new(SubmissionScope::default(), "global")),
            Submission::Enabled(EnabledSubmission::new(
                SubmissionScope {
                    site: Some(site),
                    ..SubmissionScope::default()
                },
                "editing",
            )),
        ];
        support.add_submissions(&batch);

        assert!(support.registry().active_context_ids().contains("global"));
        assert!(!support.registry().active_context_ids().contains("editing"));

        support.reresolve(
            ActiveScope {
                site: Some(site),
                ..ActiveScope::default()
            },
            false,
        );
        assert!(support.registry().active_context_ids().contains("editing"));
    }

    #[test]
    fn test_conflict_reporting_can_be_disabled() {
        let sink = Rc::new(RecordingSink::new());
        let options = DebugOptions {
            report_conflicts: false,
            ..DebugOptions::default()
        };
        let mut support = CommandSupport::new(options, sink.clone());

        let batch = vec![
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.paste",
                Priority::Medium,
                handler(),
            )),
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.paste",
                Priority::Medium,
                handler(),
            )),
        ];
        support.add_submissions(&batch);

        // Still no winner, but nothing reported.
        assert!(support.registry().handler_for("edit.paste").is_none());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_verbose_traces_resolved_conflicts() {
        let sink = Rc::new(RecordingSink::new());
        let options = DebugOptions {
            verbose: true,
            ..DebugOptions::default()
        };
        let mut support = CommandSupport::new(options, sink.clone());

        let batch = vec![
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.copy",
                Priority::Low,
                handler(),
            )),
            Submission::Handler(HandlerSubmission::new(
                SubmissionScope::default(),
                "edit.copy",
                Priority::High,
                handler(),
            )),
        ];
        support.add_submissions(&batch);

        let messages = sink.take();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("resolved handler conflict"));
    }
}
