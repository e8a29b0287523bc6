//! Configuration for logspace
//!
//! Environment-based configuration with defaults and validation. Only the
//! knobs this core actually consumes live here; transport, persistence and
//! process concerns belong to the embedding application.

use serde::{Deserialize, Serialize};
use std::env;

mod error;

pub use error::ConfigError;

/// Default block size the private view pads serialized envelopes to
pub const DEFAULT_PAD_BLOCK_SIZE: usize = 24;

/// Default number of root-registry entries scanned for the idempotence guard
pub const DEFAULT_REGISTRY_SCAN_LIMIT: usize = 100;

/// Tunables for a space and its views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceConfig {
    /// Block size (bytes) the private view pads serialized envelopes to
    pub pad_block_size: usize,

    /// How many root-registry entries to scan before registering an address
    pub registry_scan_limit: usize,

    /// Entry-count hint handed to the log engine's sync (fast-path vs full replay)
    pub sync_entry_hint: Option<usize>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            pad_block_size: DEFAULT_PAD_BLOCK_SIZE,
            registry_scan_limit: DEFAULT_REGISTRY_SCAN_LIMIT,
            sync_entry_hint: None,
        }
    }
}

impl SpaceConfig {
    /// Load configuration from environment variables
    ///
    /// Variables follow the pattern `LOGSPACE_<KEY>`, e.g.
    /// `LOGSPACE_PAD_BLOCK_SIZE=48`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(block) = env::var("LOGSPACE_PAD_BLOCK_SIZE") {
            config.pad_block_size = block
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid pad block size: {}", e)))?;
        }
        if let Ok(limit) = env::var("LOGSPACE_REGISTRY_SCAN_LIMIT") {
            config.registry_scan_limit = limit.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid registry scan limit: {}", e))
            })?;
        }
        if let Ok(hint) = env::var("LOGSPACE_SYNC_ENTRY_HINT") {
            config.sync_entry_hint = Some(hint.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid sync entry hint: {}", e))
            })?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pad_block_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "pad_block_size must be greater than 0".to_string(),
            ));
        }
        if self.registry_scan_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "registry_scan_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpaceConfig::default();
        assert_eq!(config.pad_block_size, DEFAULT_PAD_BLOCK_SIZE);
        assert_eq!(config.registry_scan_limit, DEFAULT_REGISTRY_SCAN_LIMIT);
        assert!(config.sync_entry_hint.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_block() {
        let config = SpaceConfig {
            pad_block_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_scan_limit() {
        let config = SpaceConfig {
            registry_scan_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
