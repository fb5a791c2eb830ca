//! Ledger configuration, loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use custodia_contracts::error::{LedgerError, LedgerResult};

/// Tunables for the append path.
///
/// ```toml
/// max_append_attempts = 8
/// retry_backoff_ms = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// How many times one `append` call may retry after a tail conflict
    /// before surfacing a contention error. Must be at least 1.
    pub max_append_attempts: u32,

    /// Base backoff between contention retries, scaled linearly by attempt
    /// number. Zero disables sleeping (useful under test).
    pub retry_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_append_attempts: 5,
            retry_backoff_ms: 5,
        }
    }
}

impl LedgerConfig {
    /// Parse `s` as TOML. Absent keys fall back to their defaults.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let config: LedgerConfig = toml::from_str(s).map_err(|e| LedgerError::Config {
            reason: format!("failed to parse ledger config TOML: {e}"),
        })?;
        if config.max_append_attempts == 0 {
            return Err(LedgerError::Config {
                reason: "max_append_attempts must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::Config {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }
}
