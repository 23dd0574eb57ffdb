//! Core functionality for the FloatChat float explorer
//!
//! This crate owns the float data model, the dataset store that every
//! renderer subscribes to, and the cooperative scheduling primitives the
//! views use for animation.

pub mod animation;
pub mod events;
pub mod filter;
pub mod model;
pub mod schedule;
pub mod state;
pub mod stats;
pub mod store;
pub mod view;

use thiserror::Error;

// Re-export commonly used types
pub use animation::{Animator, Easing, Property, Repeat, Tween};
pub use events::{handler_from_fn, EventBus};
pub use filter::{FilterControls, FilterCriteria};
pub use model::{
    FloatId, FloatRecord, GeoPosition, Measurements, Parameter, Quality, Region, Status,
};
pub use schedule::{Scheduler, TaskHandle};
pub use state::AppState;
pub use stats::{AnomalyReport, DatasetSummary, ProfileModel, RegionSummary, SeasonalCycle};
pub use store::{
    subscriber_from_fn, DatasetSnapshot, FloatStore, StoreEvent, StoreSubscriber, SubscriptionId,
};
pub use view::{ViewMode, ViewState};

/// Errors surfaced by store, generator and adapter operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("float '{0}' not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{adapter} unavailable: {reason}")]
    ResourceUnavailable { adapter: String, reason: String },
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidInput(message.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
