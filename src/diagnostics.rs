//! Diagnostic sink for conflict and trace messages
//!
//! The arbitrator reports unresolved handler conflicts (and, with verbose
//! debugging on, resolved ones) as free text. The default sink routes to
//! `tracing`; tests and tooling can substitute a recording sink.

use std::cell::RefCell;

/// Receives free-text conflict/trace messages. The core writes, never reads.
pub trait DiagnosticSink {
    fn message(&self, text: &str);
}

/// Default sink: forwards messages to the `tracing` infrastructure.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn message(&self, text: &str) {
        tracing::debug!("{text}");
    }
}

/// Captures messages for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.messages.borrow_mut())
    }
}

impl DiagnosticSink for RecordingSink {
    fn message(&self, text: &str) {
        self.messages.borrow_mut().push(text.to_string());
    }
}
