//! Store subscriber trait

use std::sync::Arc;

use parking_lot::Mutex;

use super::StoreEvent;

/// Trait for components that need to respond to store changes
pub trait StoreSubscriber: Send + Sync {
    /// Called for every dataset, filter and selection change
    fn on_store_event(&self, event: &StoreEvent);
}

/// Subscriber backed by a closure
pub struct ClosureSubscriber<F> {
    handler: Mutex<F>,
}

impl<F> StoreSubscriber for ClosureSubscriber<F>
where
    F: FnMut(&StoreEvent) + Send,
{
    fn on_store_event(&self, event: &StoreEvent) {
        (self.handler.lock())(event);
    }
}

/// Create a subscriber from a closure.
///
/// The store only keeps a weak reference, so the caller must hold on to the
/// returned `Arc` for as long as it wants notifications.
pub fn subscriber_from_fn<F>(f: F) -> Arc<dyn StoreSubscriber>
where
    F: FnMut(&StoreEvent) + Send + 'static,
{
    Arc::new(ClosureSubscriber {
        handler: Mutex::new(f),
    })
}
