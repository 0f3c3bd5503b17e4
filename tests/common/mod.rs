//! Shared fixtures for the integration suites

use std::cell::Cell;
use std::rc::Rc;

use workbench_commands::{Action, Handler};

/// Handler that counts executions and disposals.
#[derive(Default)]
pub struct CountingHandler {
    pub executions: Cell<u32>,
    pub disposals: Cell<u32>,
}

impl CountingHandler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

impl Handler for CountingHandler {
    fn execute(&self) {
        self.executions.set(self.executions.get() + 1);
    }

    fn dispose(&self) {
        self.disposals.set(self.disposals.get() + 1);
    }
}

/// Action identified by a fixed command id, counting its runs.
pub struct CountingAction {
    id: String,
    pub runs: Cell<u32>,
}

impl CountingAction {
    pub fn new(id: &str) -> Rc<Self> {
        Rc::new(Self {
            id: id.to_string(),
            runs: Cell::new(0),
        })
    }
}

impl Action for CountingAction {
    fn command_id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn run(&self) {
        self.runs.set(self.runs.get() + 1);
    }
}
