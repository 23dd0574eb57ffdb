//! Store-to-adapter wiring

use std::sync::Arc;

use fc_core::{CoreResult, FloatStore, StoreEvent, StoreSubscriber, SubscriptionId};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::adapter::{Container, RendererAdapter, SelectHandler};

/// Forwards store notifications to one mounted adapter.
///
/// Clicks travel the other way through the handler injected at mount, which
/// only holds a weak reference to the store.
pub struct AdapterBinding {
    adapter: Arc<dyn RendererAdapter>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl AdapterBinding {
    /// Mount `adapter`, replay the current store state into it and subscribe.
    pub fn bind(
        store: &Arc<FloatStore>,
        adapter: Arc<dyn RendererAdapter>,
        container: Container,
    ) -> CoreResult<Arc<Self>> {
        let weak_store = Arc::downgrade(store);
        let name = adapter.kind().as_str();
        let on_user_select: SelectHandler = Arc::new(move |id: &str| {
            let Some(store) = weak_store.upgrade() else {
                return;
            };
            if let Err(e) = store.select(id) {
                warn!(adapter = name, "click on {} ignored: {}", id, e);
            }
        });

        adapter.mount(container, on_user_select)?;

        let snapshot = store.snapshot();
        adapter.on_dataset_changed(&snapshot.visible);
        if snapshot.selection.is_some() {
            adapter.on_selection_changed(None, snapshot.selection.as_deref());
        }

        let binding = Arc::new(Self {
            adapter,
            subscription: Mutex::new(None),
        });
        let id = store.subscribe(binding.clone());
        *binding.subscription.lock() = Some(id);
        debug!(adapter = name, "adapter bound to store");
        Ok(binding)
    }

    pub fn adapter(&self) -> &Arc<dyn RendererAdapter> {
        &self.adapter
    }

    pub fn is_bound(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Unsubscribe and unmount; safe to call more than once
    pub fn release(&self, store: &FloatStore) {
        if let Some(id) = self.subscription.lock().take() {
            store.unsubscribe(id);
        }
        self.adapter.unmount();
    }
}

impl StoreSubscriber for AdapterBinding {
    fn on_store_event(&self, event: &StoreEvent) {
        if !self.adapter.is_mounted() {
            return;
        }
        match event {
            StoreEvent::DatasetChanged(snapshot) | StoreEvent::FilterChanged(snapshot) => {
                self.adapter.on_dataset_changed(&snapshot.visible);
            }
            StoreEvent::SelectionChanged { previous, current } => {
                self.adapter
                    .on_selection_changed(previous.as_deref(), current.as_deref());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_globe::DomGlobeAdapter;
    use crate::reconcile::test_support::dataset;
    use crate::AdapterSettings;
    use fc_core::{FilterCriteria, Quality, Region, Scheduler};

    fn setup() -> (Arc<FloatStore>, Arc<DomGlobeAdapter>) {
        let store = Arc::new(FloatStore::new());
        store.load(dataset(15)).unwrap();
        let scheduler = Arc::new(Scheduler::new());
        let adapter = Arc::new(DomGlobeAdapter::new(scheduler, AdapterSettings::default()));
        (store, adapter)
    }

    #[test]
    fn test_bind_replays_current_state() {
        let (store, adapter) = setup();
        let first = store.visible_ids()[0].clone();
        store.select(&first).unwrap();

        let _binding =
            AdapterBinding::bind(&store, adapter.clone(), Container::new("globe", 360.0, 180.0)).unwrap();
        assert_eq!(adapter.primitive_ids(), store.visible_ids());
        assert_eq!(adapter.highlighted(), Some(first));
    }

    #[test]
    fn test_binding_follows_filter_and_selection() {
        let (store, adapter) = setup();
        let _binding =
            AdapterBinding::bind(&store, adapter.clone(), Container::new("globe", 360.0, 180.0)).unwrap();

        store.apply_filter(FilterCriteria::match_all().with_quality(Quality::High));
        assert_eq!(adapter.primitive_ids(), store.visible_ids());

        let id = store.visible_ids()[0].clone();
        assert!(adapter.user_select(&id));
        assert_eq!(store.selection(), Some(id.clone()));
        assert_eq!(adapter.highlighted(), Some(id));
    }

    #[test]
    fn test_release_stops_notifications() {
        let (store, adapter) = setup();
        let binding =
            AdapterBinding::bind(&store, adapter.clone(), Container::new("globe", 360.0, 180.0)).unwrap();
        assert_eq!(store.subscriber_count(), 1);

        binding.release(&store);
        binding.release(&store);
        assert!(!binding.is_bound());
        assert_eq!(store.subscriber_count(), 0);

        store.apply_filter(FilterCriteria::match_all().with_region(Region::PacificOcean));
        assert!(adapter.primitive_ids().is_empty());
    }

    #[test]
    fn test_click_after_store_dropped_is_ignored() {
        let (store, adapter) = setup();
        let _binding =
            AdapterBinding::bind(&store, adapter.clone(), Container::new("globe", 360.0, 180.0)).unwrap();
        let id = store.visible_ids()[0].clone();
        drop(store);
        assert!(adapter.user_select(&id));
    }
}
