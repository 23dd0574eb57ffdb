//! Application state management

use std::sync::Arc;

use crate::events::EventBus;
use crate::schedule::Scheduler;
use crate::store::FloatStore;

/// Shared handles injected into adapters, controllers and panels.
///
/// Nothing here is a global: the application builds one `AppState` and hands
/// clones of the `Arc`s to whoever needs them.
#[derive(Clone, Default)]
pub struct AppState {
    pub store: Arc<FloatStore>,
    pub scheduler: Arc<Scheduler>,
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}
