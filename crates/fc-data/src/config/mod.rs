//! Application configuration
//!
//! A single JSON file, every field optional. Durations are written the
//! humantime way (`"450ms"`, `"2s"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fc_core::{CoreError, ViewMode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::AnalysisConfig;
use crate::assistant::{TypingSettings, UserMode};
use crate::generator::{GeneratorConfig, RegionBounds};
use crate::{DataError, DataResult};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "FLOATCHAT_CONFIG";

/// File looked up in the working directory when the variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "floatchat.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub session: SessionConfig,
    pub chat: ChatConfig,
    pub view: ViewConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Signed so that a negative count is reported rather than failing to parse
    pub float_count: i64,
    pub seed: u64,
    pub active_probability: f64,
    pub oxygen_probability: f64,
    pub reference_time: DateTime<Utc>,
    pub history_years: u32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let generator = GeneratorConfig::default();
        Self {
            float_count: 200,
            seed: generator.seed,
            active_probability: generator.active_probability,
            oxygen_probability: generator.oxygen_probability,
            reference_time: generator.reference_time,
            history_years: generator.history_years,
        }
    }
}

impl DatasetConfig {
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            seed: self.seed,
            regions: RegionBounds::defaults(),
            active_probability: self.active_probability,
            oxygen_probability: self.oxygen_probability,
            reference_time: self.reference_time,
            history_years: self.history_years,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub data_dir: PathBuf,

    /// Name of the single key-value slot
    pub key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".floatchat"),
            key: "floatchat-session".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub thinking_delay: String,
    pub typing_interval: String,
    pub chars_per_tick: usize,
    pub default_mode: UserMode,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            thinking_delay: "600ms".to_string(),
            typing_interval: "20ms".to_string(),
            chars_per_tick: 3,
            default_mode: UserMode::default(),
        }
    }
}

impl ChatConfig {
    pub fn thinking_delay(&self) -> DataResult<Duration> {
        Ok(humantime::parse_duration(&self.thinking_delay)?)
    }

    pub fn typing_interval(&self) -> DataResult<Duration> {
        Ok(humantime::parse_duration(&self.typing_interval)?)
    }

    pub fn typing_settings(&self) -> DataResult<TypingSettings> {
        Ok(TypingSettings {
            thinking_delay: self.thinking_delay()?,
            typing_interval: self.typing_interval()?,
            chars_per_tick: self.chars_per_tick,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub default_mode: ViewMode,
    pub auto_rotate: bool,
    pub rotation_speed_deg_per_sec: f32,
    pub frame_interval: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_mode: ViewMode::Ocean,
            auto_rotate: true,
            rotation_speed_deg_per_sec: 6.0,
            frame_interval: "16ms".to_string(),
        }
    }
}

impl ViewConfig {
    pub fn frame_interval(&self) -> DataResult<Duration> {
        Ok(humantime::parse_duration(&self.frame_interval)?)
    }
}

impl AppConfig {
    /// Load from `FLOATCHAT_CONFIG` or `floatchat.json`; a missing file
    /// yields the defaults
    pub fn load() -> DataResult<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> DataResult<Self> {
        let config = match std::fs::read_to_string(path) {
            Ok(text) => {
                let config: AppConfig = serde_json::from_str(&text)?;
                info!(path = %path.display(), "configuration loaded");
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no configuration file, using defaults");
                AppConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DataResult<()> {
        if self.dataset.float_count < 0 {
            return Err(CoreError::invalid(format!(
                "dataset.float_count {} is negative",
                self.dataset.float_count
            ))
            .into());
        }
        self.dataset.generator_config().validate()?;

        self.chat.thinking_delay()?;
        if self.chat.typing_interval()?.is_zero() {
            return Err(CoreError::invalid("chat.typing_interval must be non-zero").into());
        }
        if self.chat.chars_per_tick == 0 {
            return Err(CoreError::invalid("chat.chars_per_tick must be at least 1").into());
        }

        if self.view.frame_interval()?.is_zero() {
            return Err(CoreError::invalid("view.frame_interval must be non-zero").into());
        }
        if !self.view.rotation_speed_deg_per_sec.is_finite() {
            return Err(CoreError::invalid("view.rotation_speed_deg_per_sec must be finite").into());
        }

        self.analysis.validate()?;

        if self.session.key.trim().is_empty() {
            return Err(DataError::Config("session.key must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.chat.thinking_delay().unwrap(), Duration::from_millis(600));
        assert_eq!(config.view.frame_interval().unwrap(), Duration::from_millis(16));
        assert_eq!(config.chat.typing_settings().unwrap(), TypingSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"dataset": {{"float_count": 15, "seed": 9}}, "view": {{"default_mode": "dark"}}}}"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.dataset.float_count, 15);
        assert_eq!(config.dataset.seed, 9);
        assert_eq!(config.view.default_mode, ViewMode::Dark);
        assert_eq!(config.chat, ChatConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let mut config = AppConfig::default();
        config.dataset.float_count = -3;
        assert!(matches!(
            config.validate(),
            Err(DataError::Core(CoreError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let mut config = AppConfig::default();
        config.chat.typing_interval = "soon".to_string();
        assert!(matches!(config.validate(), Err(DataError::Duration(_))));
    }

    #[test]
    fn test_analysis_section_is_validated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"analysis": {{"anomaly_sigmas": 3.0, "anomaly_spikes": 5}}}}"#).unwrap();
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.analysis.anomaly_sigmas, 3.0);
        assert_eq!(config.analysis.anomaly_spikes, 5);
        assert_eq!(config.analysis.first_year, AnalysisConfig::default().first_year);

        let mut config = AppConfig::default();
        config.analysis.last_year = config.analysis.first_year - 1;
        assert!(matches!(
            config.validate(),
            Err(DataError::Core(CoreError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(AppConfig::load_from(file.path()), Err(DataError::Json(_))));
    }
}
