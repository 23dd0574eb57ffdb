//! Float store implementation

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{DatasetSnapshot, StoreEvent, StoreSubscriber, SubscriptionId};
use crate::filter::FilterCriteria;
use crate::model::{FloatId, FloatRecord};
use crate::{CoreError, CoreResult};

/// Store state guarded by a single lock
#[derive(Debug)]
struct StoreState {
    records: Vec<Arc<FloatRecord>>,
    index: AHashMap<FloatId, usize>,
    criteria: FilterCriteria,
    visible: Arc<[Arc<FloatRecord>]>,
    selection: Option<FloatId>,
    revision: u64,
}

impl StoreState {
    fn recompute_visible(&mut self) {
        let visible: Vec<Arc<FloatRecord>> = self
            .records
            .iter()
            .filter(|record| self.criteria.matches(record))
            .cloned()
            .collect();
        self.visible = Arc::from(visible);
    }

    fn snapshot(&self) -> DatasetSnapshot {
        DatasetSnapshot {
            visible: self.visible.clone(),
            criteria: self.criteria.clone(),
            selection: self.selection.clone(),
            total: self.records.len(),
            revision: self.revision,
        }
    }
}

/// A validated mutation waiting to be applied
enum StoreCommand {
    Load {
        records: Vec<Arc<FloatRecord>>,
        index: AHashMap<FloatId, usize>,
    },
    ApplyFilter(FilterCriteria),
    Select(FloatId),
    Deselect,
}

impl StoreCommand {
    fn name(&self) -> &'static str {
        match self {
            StoreCommand::Load { .. } => "load",
            StoreCommand::ApplyFilter(_) => "apply_filter",
            StoreCommand::Select(_) => "select",
            StoreCommand::Deselect => "deselect",
        }
    }
}

/// Marks the store as delivering for the lifetime of the guard
struct DeliveryGuard<'a>(&'a AtomicBool);

impl<'a> DeliveryGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The float dataset store.
///
/// Mutations requested while a notification is being delivered are validated
/// immediately but applied only after the current delivery cycle finishes, so
/// every subscriber observes the same snapshot for a given event.
pub struct FloatStore {
    state: RwLock<StoreState>,
    subscribers: RwLock<Vec<(SubscriptionId, Weak<dyn StoreSubscriber>)>>,
    next_subscription: AtomicU64,
    delivering: AtomicBool,
    pending: Mutex<VecDeque<StoreCommand>>,
}

impl FloatStore {
    /// Create an empty store with a match-all filter
    pub fn new() -> Self {
        let state = StoreState {
            records: Vec::new(),
            index: AHashMap::new(),
            criteria: FilterCriteria::match_all(),
            visible: Arc::from(Vec::new()),
            selection: None,
            revision: 0,
        };

        Self {
            state: RwLock::new(state),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            delivering: AtomicBool::new(false),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Replace the full dataset and clear the selection.
    ///
    /// Duplicate ids are rejected before anything is mutated.
    pub fn load(&self, records: Vec<FloatRecord>) -> CoreResult<()> {
        let mut index = AHashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), position).is_some() {
                return Err(CoreError::invalid(format!("duplicate float id '{}'", record.id)));
            }
        }

        let records = records.into_iter().map(Arc::new).collect();
        self.submit(StoreCommand::Load { records, index });
        Ok(())
    }

    /// Store `criteria` and recompute the visible subset
    pub fn apply_filter(&self, criteria: FilterCriteria) {
        self.submit(StoreCommand::ApplyFilter(criteria));
    }

    /// Equivalent to applying the match-all criteria
    pub fn clear_filter(&self) {
        self.apply_filter(FilterCriteria::match_all());
    }

    /// Select a float by id.
    ///
    /// Selection does not depend on filter visibility: any id in the dataset
    /// can be selected. During delivery the id is checked against the dataset
    /// the select will actually be applied to, i.e. the last queued load.
    pub fn select(&self, id: &str) -> CoreResult<()> {
        if !self.will_contain(id) {
            return Err(CoreError::NotFound(id.to_string()));
        }
        self.submit(StoreCommand::Select(id.to_string()));
        Ok(())
    }

    /// Clear the selection; a no-op when nothing is selected
    pub fn deselect(&self) {
        self.submit(StoreCommand::Deselect);
    }

    /// Register a subscriber. Notifications are delivered in subscription order.
    pub fn subscribe(&self, subscriber: Arc<dyn StoreSubscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::downgrade(&subscriber)));
        debug!(subscription = id.0, "store subscriber added");
        id
    }

    /// Remove a subscriber; returns false when it was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!(subscription = id.0, "store subscriber removed");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Remove every subscriber, e.g. when the application shuts down
    pub fn unsubscribe_all(&self) {
        self.subscribers.write().clear();
        self.pending.lock().clear();
    }

    /// Current dataset snapshot
    pub fn snapshot(&self) -> DatasetSnapshot {
        self.state.read().snapshot()
    }

    pub fn visible(&self) -> Arc<[Arc<FloatRecord>]> {
        self.state.read().visible.clone()
    }

    pub fn visible_ids(&self) -> Vec<FloatId> {
        self.state.read().visible.iter().map(|r| r.id.clone()).collect()
    }

    pub fn records(&self) -> Vec<Arc<FloatRecord>> {
        self.state.read().records.clone()
    }

    pub fn selection(&self) -> Option<FloatId> {
        self.state.read().selection.clone()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.state.read().criteria.clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<FloatRecord>> {
        let state = self.state.read();
        state.index.get(id).map(|&i| state.records[i].clone())
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while subscribers are being notified
    pub fn is_delivering(&self) -> bool {
        self.delivering.load(Ordering::Acquire)
    }

    /// Whether `id` exists in the dataset once every queued command has run
    fn will_contain(&self, id: &str) -> bool {
        let queued = self.pending.lock().iter().rev().find_map(|command| match command {
            StoreCommand::Load { index, .. } => Some(index.contains_key(id)),
            _ => None,
        });
        queued.unwrap_or_else(|| self.state.read().index.contains_key(id))
    }

    /// Apply a command now, or queue it when a delivery is in progress
    fn submit(&self, command: StoreCommand) {
        if self.is_delivering() {
            debug!(command = command.name(), "store delivering, deferring mutation");
            self.pending.lock().push_back(command);
            return;
        }

        let mut next = Some(command);
        while let Some(command) = next {
            let events = self.apply(command);
            self.deliver(&events);
            next = self.pending.lock().pop_front();
        }
    }

    fn apply(&self, command: StoreCommand) -> Vec<StoreEvent> {
        let mut state = self.state.write();
        let mut events = Vec::new();

        match command {
            StoreCommand::Load { records, index } => {
                state.records = records;
                state.index = index;
                state.recompute_visible();
                state.revision += 1;
                let previous = state.selection.take();

                info!(
                    total = state.records.len(),
                    visible = state.visible.len(),
                    revision = state.revision,
                    "dataset loaded"
                );
                events.push(StoreEvent::DatasetChanged(state.snapshot()));
                if previous.is_some() {
                    events.push(StoreEvent::SelectionChanged { previous, current: None });
                }
            }
            StoreCommand::ApplyFilter(criteria) => {
                state.criteria = criteria;
                state.recompute_visible();
                state.revision += 1;

                info!(
                    filter = %state.criteria.describe(),
                    visible = state.visible.len(),
                    total = state.records.len(),
                    "filter applied"
                );
                events.push(StoreEvent::FilterChanged(state.snapshot()));
            }
            StoreCommand::Select(id) => {
                if !state.index.contains_key(&id) {
                    // A deferred select can be overtaken by a queued load
                    warn!(float = %id, "dropping selection of float no longer in dataset");
                } else if state.selection.as_deref() != Some(id.as_str()) {
                    let previous = state.selection.replace(id.clone());
                    debug!(?previous, current = %id, "selection changed");
                    events.push(StoreEvent::SelectionChanged {
                        previous,
                        current: Some(id),
                    });
                }
            }
            StoreCommand::Deselect => {
                if let Some(previous) = state.selection.take() {
                    debug!(previous = %previous, "selection cleared");
                    events.push(StoreEvent::SelectionChanged {
                        previous: Some(previous),
                        current: None,
                    });
                }
            }
        }

        events
    }

    fn deliver(&self, events: &[StoreEvent]) {
        if events.is_empty() {
            return;
        }

        let live: Vec<(SubscriptionId, Arc<dyn StoreSubscriber>)> = {
            let mut subscribers = self.subscribers.write();

            // Remove any dead weak references
            subscribers.retain(|(_, weak)| weak.strong_count() > 0);
            subscribers
                .iter()
                .filter_map(|(id, weak)| weak.upgrade().map(|s| (*id, s)))
                .collect()
        };

        let _guard = DeliveryGuard::enter(&self.delivering);
        for event in events {
            for (id, subscriber) in &live {
                // A subscriber may have been removed by an earlier callback
                if !self.is_subscribed(*id) {
                    continue;
                }
                subscriber.on_store_event(event);
            }
        }
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.read().iter().any(|(sub_id, _)| *sub_id == id)
    }
}

impl Default for FloatStore {
    fn default() -> Self {
        Self::new()
    }
}
