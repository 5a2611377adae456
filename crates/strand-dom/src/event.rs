//! Event abstraction

use std::cell::Cell;

/// The parts of a DOM `Event` interception needs.
pub trait DomEvent {
    fn default_prevented(&self) -> bool;

    fn prevent_default(&self);

    fn stop_propagation(&self);
}

/// A plain event, for hosts that deliver clicks and submissions without a
/// real DOM.
#[derive(Debug, Default, Clone)]
pub struct SyntheticEvent {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl SyntheticEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// An event some earlier listener already prevented.
    pub fn prevented() -> Self {
        let event = Self::new();
        event.prevent_default();
        event
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

impl DomEvent for SyntheticEvent {
    fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}
