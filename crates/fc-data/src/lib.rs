//! Data sources for the float explorer: the synthetic float generator,
//! the analysis series, application configuration, the persisted session
//! slot and the canned chat assistant.

pub mod analysis;
pub mod assistant;
pub mod config;
pub mod generator;
pub mod session;

use fc_core::CoreError;
use thiserror::Error;

// Re-exports
pub use analysis::{
    AnalysisConfig, AnalysisGenerator, AnalysisSeries, DailySample, DepthProfile, MonthlySample,
};
pub use assistant::{
    CannedResponder, Conversation, ConversationState, Intent, IntentClassifier, ResponseGenerator,
    TypingSettings, UserMode,
};
pub use config::AppConfig;
pub use generator::{FloatGenerator, GeneratorConfig, RegionBounds};
pub use session::{
    ChatEntry, ChatRole, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, PersistedSession,
    SessionStore,
};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid duration: {0}")]
    Duration(#[from] humantime::DurationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type DataResult<T> = Result<T, DataError>;
