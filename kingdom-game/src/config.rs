//! Deployment settings for a Kingdom client.
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    DEFAULT_ENDPOINT, DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS,
    DEFAULT_STORAGE_VERSION,
};
use crate::resources::ResourceVector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "GameConfig::default_storage_version")]
    pub storage_version: String,
    #[serde(default = "GameConfig::default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "GameConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "GameConfig::default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default)]
    pub initial_resources: ResourceVector,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("endpoint must not be empty")]
    EmptyEndpoint,
    #[error("storage version must not be empty")]
    EmptyStorageVersion,
    #[error("history limit must be at least 1")]
    ZeroHistoryLimit,
    #[error("poll interval must be at least 1ms")]
    ZeroPollInterval,
    #[error("poll timeout ({timeout_ms}ms) is shorter than the poll interval ({interval_ms}ms)")]
    TimeoutBelowInterval { interval_ms: u64, timeout_ms: u64 },
    #[error("initial resources {0:?} are outside the allowed range")]
    InitialResourcesOutOfRange(ResourceVector),
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            storage_version: Self::default_storage_version(),
            history_limit: Self::default_history_limit(),
            poll_interval_ms: Self::default_poll_interval_ms(),
            poll_timeout_ms: Self::default_poll_timeout_ms(),
            initial_resources: ResourceVector::initial(),
        }
    }
}

impl GameConfig {
    fn default_endpoint() -> String {
        DEFAULT_ENDPOINT.to_string()
    }

    fn default_storage_version() -> String {
        DEFAULT_STORAGE_VERSION.to_string()
    }

    const fn default_history_limit() -> usize {
        DEFAULT_HISTORY_LIMIT
    }

    const fn default_poll_interval_ms() -> u64 {
        DEFAULT_POLL_INTERVAL_MS
    }

    const fn default_poll_timeout_ms() -> u64 {
        DEFAULT_POLL_TIMEOUT_MS
    }

    /// Parse and validate a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns the first out-of-range setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.storage_version.trim().is_empty() {
            return Err(ConfigError::EmptyStorageVersion);
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll_timeout_ms < self.poll_interval_ms {
            return Err(ConfigError::TimeoutBelowInterval {
                interval_ms: self.poll_interval_ms,
                timeout_ms: self.poll_timeout_ms,
            });
        }
        if !self.initial_resources.is_within_bounds() {
            return Err(ConfigError::InitialResourcesOutOfRange(
                self.initial_resources,
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = GameConfig::from_json("{}").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.poll_timeout(), Duration::from_secs(15));
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn overrides_are_applied() {
        let config = GameConfig::from_json(
            r#"{"endpoint": "https://example.test/api", "pollIntervalMs": 250, "initialResources": {"people": 6, "army": 4, "treasury": 5, "faith": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint, "https://example.test/api");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.initial_resources.people, 6);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            GameConfig::from_json(r#"{"pollIntervalMs": 0}"#),
            Err(ConfigError::ZeroPollInterval)
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"pollIntervalMs": 1000, "pollTimeoutMs": 10}"#),
            Err(ConfigError::TimeoutBelowInterval { .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"historyLimit": 0}"#),
            Err(ConfigError::ZeroHistoryLimit)
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"initialResources": {"people": 12}}"#),
            Err(ConfigError::InitialResourcesOutOfRange(_))
        ));
        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
