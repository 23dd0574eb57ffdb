//! Application event bus
//!
//! Carries notifications that are not float domain state: adapter failures,
//! view-mode broadcasts, dataset regeneration. Handlers are keyed by the
//! concrete event type.

use std::any::{Any, TypeId};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

/// System-wide event bus
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Common application events
pub mod events {
    use super::Event;
    use crate::view::ViewMode;

    /// A freshly generated dataset was loaded into the store
    #[derive(Debug, Clone)]
    pub struct DatasetLoaded {
        pub count: usize,
        pub seed: u64,
    }

    /// A renderer adapter failed to acquire its resources and was disabled
    #[derive(Debug, Clone)]
    pub struct AdapterDisabled {
        pub adapter: String,
        pub reason: String,
    }

    /// The view mode was broadcast to the mounted adapters
    #[derive(Debug, Clone)]
    pub struct ViewModeChanged {
        pub mode: ViewMode,
    }

    /// The chat assistant switched persona
    #[derive(Debug, Clone)]
    pub struct ChatModeChanged {
        pub mode: String,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(DatasetLoaded, AdapterDisabled, ViewModeChanged, ChatModeChanged);
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_default().push(handler);
    }

    /// Publish an event to every handler registered for its type.
    ///
    /// Handlers must not publish on the same bus; the handler table is locked
    /// for the duration of the call.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }

    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event handler backed by a closure
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
