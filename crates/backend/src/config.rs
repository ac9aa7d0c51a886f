use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Connection settings for the platform API.
#[derive(Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Sent with prediction requests.
    pub user_id: u64,
    pub request_timeout: Duration,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user_id", &self.user_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_id: 1,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Read `PRACTICE_API_URL`, `PRACTICE_API_TOKEN`, `PRACTICE_USER_ID` and
    /// `PRACTICE_REQUEST_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] but reading from an arbitrary source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_blank("PRACTICE_API_URL") {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        config.token = non_blank("PRACTICE_API_TOKEN").map(|t| t.trim().to_string());
        if let Some(raw) = non_blank("PRACTICE_USER_ID") {
            config.user_id = parse_u64("PRACTICE_USER_ID", &raw)?;
        }
        if let Some(raw) = non_blank("PRACTICE_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_u64("PRACTICE_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

fn parse_u64(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = BackendConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert!(config.token.is_none());
        assert_eq!(config.user_id, 1);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_overrides_and_trims_url() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("PRACTICE_API_URL", "https://exam.example/api/"),
            ("PRACTICE_API_TOKEN", "secret"),
            ("PRACTICE_USER_ID", "42"),
            ("PRACTICE_REQUEST_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://exam.example/api");
        assert_eq!(config.user_id, 42);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn rejects_non_numeric_user_id() {
        let err = BackendConfig::from_lookup(lookup(&[("PRACTICE_USER_ID", "me")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PRACTICE_USER_ID",
                value: "me".into()
            }
        );
    }
}
