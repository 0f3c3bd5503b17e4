//! Handler and action capabilities, and the action-to-handler bridge
//!
//! A `Handler` is the opaque implementation installed for a command id.
//! Legacy `Action` values are bridged into handlers by wrapping them in an
//! [`ActionHandler`]; the bridge refuses values that already wrap the
//! opposite direction so registrations cannot feed back into the system.

use std::cell::Cell;
use std::rc::Rc;

/// Opaque implementation of a command.
///
/// The core never inspects a handler beyond its identity; `dispose` is
/// called exactly once per instance the core owns (action wrappers), when
/// the owning registration is removed or its service is disposed.
pub trait Handler {
    /// Invoke the handler. Dispatch itself lives outside this crate; this
    /// is the capability dispatch calls through.
    fn execute(&self);

    /// Lifecycle hook for owned handlers. Default: nothing to release.
    fn dispose(&self) {}
}

/// Where an action value originally came from.
///
/// Only `Native` actions may pass through the bridge. The other two mark
/// values that were themselves derived from the command system and would
/// loop back through it if re-registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOrigin {
    /// An ordinary action contributed by application code.
    Native,
    /// A fake action wrapping an already-registered handler.
    WrapsHandler,
    /// An action synthesized from a command definition.
    FromCommand,
}

/// Legacy invocable behavior identified by a command id.
///
/// The core wraps actions into handlers; it never invokes one directly.
pub trait Action {
    /// The command id this action implements, or `None` if the action is
    /// not command-backed (such actions are ignored by the bridge).
    fn command_id(&self) -> Option<&str>;

    /// Origin marker used to reject feedback registrations.
    fn origin(&self) -> ActionOrigin {
        ActionOrigin::Native
    }

    /// Run the action's behavior.
    fn run(&self);
}

/// Handler wrapper around a legacy action.
///
/// Created internally by `register_action`; the creating service owns the
/// wrapper and disposes it when the registration is removed.
pub struct ActionHandler {
    action: Rc<dyn Action>,
    disposed: Cell<bool>,
}

impl ActionHandler {
    pub fn new(action: Rc<dyn Action>) -> Rc<Self> {
        Rc::new(Self {
            action,
            disposed: Cell::new(false),
        })
    }
}

impl Handler for ActionHandler {
    fn execute(&self) {
        if !self.disposed.get() {
            self.action.run();
        }
    }

    fn dispose(&self) {
        self.disposed.set(true);
    }
}
