//! State-change listeners
//!
//! Listeners are owned by the engine and dropped on reset. They are called
//! synchronously, most recently registered first.

use objsim_core::state::{StateChangeEvent, StateDifference};

use super::System;

pub trait StateChangeListener {
    fn state_changed(&mut self, event: &StateChangeEvent);
}

impl<F> StateChangeListener for F
where
    F: FnMut(&StateChangeEvent),
{
    fn state_changed(&mut self, event: &StateChangeEvent) {
        self(event)
    }
}

/// Handle returned on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl System {
    pub fn add_change_listener(&mut self, listener: impl StateChangeListener + 'static) -> ListenerId {
        self.next_listener_id += 1;
        let id = ListenerId(self.next_listener_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the listener was not registered
    pub fn remove_change_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn num_change_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Broadcast the running evaluation's difference so far and clear it
    pub fn update_listeners(&mut self) {
        let Some(active) = self.active.last_mut() else {
            return;
        };
        let difference = active.take_difference();
        self.fire_state_changed(&difference);
    }

    pub(crate) fn fire_state_changed(&mut self, difference: &StateDifference) {
        let event = difference.to_event(self.state.id());
        tracing::trace!(
            listeners = self.listeners.len(),
            empty = difference.is_empty(),
            "firing state change"
        );
        for (_, listener) in self.listeners.iter_mut().rev() {
            listener.state_changed(&event);
        }
    }
}
