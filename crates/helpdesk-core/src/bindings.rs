//! Live control bindings.
//!
//! Clicks are only honoured for controls that have a binding here. Bindings
//! are not persisted: the open-ticket binding is registered on every start,
//! close-ticket bindings when a ticket is created or when [`crate::Recovery`]
//! finds the button in channel history.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use helpdesk_types::{ChannelId, ControlBinding, ControlId};

#[derive(Debug, Default)]
pub struct ControlBindings {
    inner: Mutex<HashSet<ControlBinding>>,
}

impl ControlBindings {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<ControlBinding>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false if the binding was already live.
    pub fn register(&self, binding: ControlBinding) -> bool {
        self.lock().insert(binding)
    }

    pub fn unregister(&self, binding: ControlBinding) -> bool {
        self.lock().remove(&binding)
    }

    /// The binding a click on `control` in `channel_id` dispatches to, if live.
    pub fn resolve(&self, control: ControlId, channel_id: ChannelId) -> Option<ControlBinding> {
        let binding = ControlBinding::for_click(control, channel_id);
        self.lock().contains(&binding).then_some(binding)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<ControlBinding> {
        self.lock().iter().copied().collect()
    }
}
