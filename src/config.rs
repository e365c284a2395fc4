//! Environment Configuration
//!
//! Settings for the `playground` tool, read from the environment. Command
//! line flags take precedence over these values.

use thiserror::Error;

use crate::core::rng::DEFAULT_SEED;

/// Variable holding the tracing filter.
pub const ENV_LOG: &str = "PLAYGROUND_LOG";
/// Variable holding the default RNG seed.
pub const ENV_SEED: &str = "PLAYGROUND_SEED";
/// Variable holding the hex-encoded credential key.
pub const ENV_CREDENTIAL_KEY: &str = "PLAYGROUND_CREDENTIAL_KEY";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Why parsing failed.
        reason: String,
    },
}

/// Tool configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Tracing filter directive, e.g. `info` or `playground=debug`.
    pub log_filter: String,
    /// Seed used when no `--seed` flag is given.
    pub default_seed: u32,
    /// Key for credential sealing, if configured.
    pub credential_key: Option<Vec<u8>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            default_seed: DEFAULT_SEED,
            credential_key: None,
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_filter = lookup(ENV_LOG)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let default_seed = match lookup(ENV_SEED) {
            Some(v) => v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                name: ENV_SEED,
                reason: format!("{}", e),
            })?,
            None => defaults.default_seed,
        };

        let credential_key = match lookup(ENV_CREDENTIAL_KEY) {
            Some(v) => Some(parse_key(ENV_CREDENTIAL_KEY, &v)?),
            None => None,
        };

        Ok(Self {
            log_filter,
            default_seed,
            credential_key,
        })
    }

    /// Check if a credential key is configured.
    pub fn has_credential_key(&self) -> bool {
        self.credential_key.is_some()
    }
}

/// Parse a hex key, rejecting empty values.
fn parse_key(name: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    let key = hex::decode(value.trim()).map_err(|e| ConfigError::InvalidValue {
        name,
        reason: e.to_string(),
    })?;
    if key.is_empty() {
        return Err(ConfigError::InvalidValue {
            name,
            reason: "key is empty".into(),
        });
    }
    Ok(key)
}

// =============================================================================
// TESTS
// =============================================================================
