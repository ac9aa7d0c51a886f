use std::env;
use std::time::Duration;

use backend::ConfigError;
use practice_core::model::AI_UNLOCK_THRESHOLD;

/// Engine tuning: the AI gate threshold and per-call timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub ai_threshold: u32,
    pub prediction_timeout: Duration,
    pub persist_timeout: Duration,
    pub lifecycle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ai_threshold: AI_UNLOCK_THRESHOLD,
            prediction_timeout: Duration::from_secs(3),
            persist_timeout: Duration::from_secs(5),
            lifecycle_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Read `PRACTICE_AI_THRESHOLD` and the `PRACTICE_*_TIMEOUT_MS` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is not a non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a variable is not a non-negative integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = read_u64(&lookup, "PRACTICE_AI_THRESHOLD")? {
            config.ai_threshold = u32::try_from(v).map_err(|_| ConfigError::Invalid {
                key: "PRACTICE_AI_THRESHOLD",
                value: v.to_string(),
            })?;
        }
        if let Some(ms) = read_u64(&lookup, "PRACTICE_PREDICTION_TIMEOUT_MS")? {
            config.prediction_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = read_u64(&lookup, "PRACTICE_PERSIST_TIMEOUT_MS")? {
            config.persist_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = read_u64(&lookup, "PRACTICE_LIFECYCLE_TIMEOUT_MS")? {
            config.lifecycle_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn read_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}
