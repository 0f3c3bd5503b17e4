//! Process-wide registry of winning handlers and enabled contexts
//!
//! Written only by the arbitrator's resolution pass, and always replaced
//! wholesale: readers see either the previous complete map or the new one,
//! never a partial update.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::handler::Handler;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers_by_command_id: HashMap<String, Rc<dyn Handler>>,
    active_context_ids: HashSet<String>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The handler currently installed for a command, if any.
    pub fn handler_for(&self, command_id: &str) -> Option<Rc<dyn Handler>> {
        self.handlers_by_command_id.get(command_id).cloned()
    }

    /// Command ids that currently have a handler installed.
    pub fn installed_command_ids(&self) -> Vec<&str> {
        self.handlers_by_command_id.keys().map(String::as_str).collect()
    }

    /// Context ids currently enabled.
    pub fn active_context_ids(&self) -> &HashSet<String> {
        &self.active_context_ids
    }

    pub(crate) fn install_handlers(&mut self, handlers: HashMap<String, Rc<dyn Handler>>) {
        self.handlers_by_command_id = handlers;
    }

    pub(crate) fn install_contexts(&mut self, contexts: HashSet<String>) {
        self.active_context_ids = contexts;
    }

    pub(crate) fn clear(&mut self) {
        self.handlers_by_command_id.clear();
        self.active_context_ids.clear();
    }
}
