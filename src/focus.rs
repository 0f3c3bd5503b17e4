//! Focus tracking and re-resolution triggers
//!
//! UI focus changes arrive as discrete events on a single-threaded queue.
//! Each event updates the active-scope tuple and triggers a (non-forced)
//! resolution pass synchronously, so the registry is never stale for more
//! than one event. Events posted while a drain is in progress join the same
//! drain instead of recursing.

use std::collections::VecDeque;

use crate::scope::{ActiveScope, ShellId, SiteId, WindowId};
use crate::support::CommandSupport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    /// A shell gained focus, or focus left the application (`None`).
    ShellActivated(Option<ShellId>),
    /// The active workbench window changed. Part observation rebinds to the
    /// new window, so the active site resets until a part change arrives.
    WindowActivated(Option<WindowId>),
    /// The active page changed within the current window.
    PageChanged,
    /// A part gained focus (`None`: no part is active).
    PartChanged(Option<SiteId>),
    /// The perspective changed within the current page.
    PerspectiveChanged,
}

#[derive(Default)]
pub struct FocusTracker {
    queue: VecDeque<FocusEvent>,
    draining: bool,
    active: ActiveScope,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope tuple as of the last processed event.
    pub fn active_scope(&self) -> ActiveScope {
        self.active
    }

    /// Deliver an event. Resolution runs synchronously before this returns,
    /// unless a drain further up the stack is already running (then that
    /// drain picks the event up).
    pub(crate) fn post(&mut self, event: FocusEvent, support: &mut CommandSupport) {
        self.queue.push_back(event);
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(event) = self.queue.pop_front() {
            self.apply(event, support);
        }
        self.draining = false;
    }

    fn apply(&mut self, event: FocusEvent, support: &mut CommandSupport) {
        match event {
            FocusEvent::ShellActivated(shell) => {
                self.active.shell = shell;
            }
            FocusEvent::WindowActivated(window) => {
                if self.active.window != window {
                    self.active.site = None;
                }
                self.active.window = window;
            }
            FocusEvent::PartChanged(site) => {
                self.active.site = site;
            }
            FocusEvent::PageChanged | FocusEvent::PerspectiveChanged => {}
        }
        support.reresolve(self.active, false);
    }
}
