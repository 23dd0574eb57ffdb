//! Float dataset store
//!
//! The single source of truth for the float collection, the active filter and
//! the current selection. Renderers subscribe and receive self-contained
//! snapshots, so they never read back from the store while rendering.

use std::sync::Arc;

use crate::filter::FilterCriteria;
use crate::model::{FloatId, FloatRecord};

mod engine;
mod subscriber;

pub use engine::FloatStore;
pub use subscriber::{subscriber_from_fn, ClosureSubscriber, StoreSubscriber};

/// Handle returned by [`FloatStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Everything a renderer needs to draw the current dataset
#[derive(Debug, Clone)]
pub struct DatasetSnapshot {
    /// Records matching `criteria`, in dataset order
    pub visible: Arc<[Arc<FloatRecord>]>,
    pub criteria: FilterCriteria,
    pub selection: Option<FloatId>,

    /// Size of the full, unfiltered dataset
    pub total: usize,

    /// Bumped on every dataset or filter change
    pub revision: u64,
}

impl DatasetSnapshot {
    pub fn visible_ids(&self) -> Vec<FloatId> {
        self.visible.iter().map(|r| r.id.clone()).collect()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.iter().any(|r| r.id == id)
    }
}

/// Change notifications fanned out to subscribers
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The dataset was replaced via `load`
    DatasetChanged(DatasetSnapshot),

    /// The filter criteria were (re)applied
    FilterChanged(DatasetSnapshot),

    /// The selected float changed
    SelectionChanged {
        previous: Option<FloatId>,
        current: Option<FloatId>,
    },
}

impl StoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::DatasetChanged(_) => "dataset",
            StoreEvent::FilterChanged(_) => "filter",
            StoreEvent::SelectionChanged { .. } => "selection",
        }
    }

    /// The snapshot carried by dataset and filter events
    pub fn snapshot(&self) -> Option<&DatasetSnapshot> {
        match self {
            StoreEvent::DatasetChanged(snapshot) | StoreEvent::FilterChanged(snapshot) => Some(snapshot),
            StoreEvent::SelectionChanged { .. } => None,
        }
    }
}
