//! Gateway configuration loading
//!
//! Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (handled by clap `env` attributes in main)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Gateway configuration
///
/// `probe_interval_ms` and `probe_timeout_ms` are deployment tunables, never
/// hard-coded: acceptable probe latency depends on the network between
/// clients and the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP/WebSocket listen port
    pub port: u16,

    /// Shared secret for token verification; 0 means "generate a random
    /// secret at startup" (auth is never disabled)
    pub shared_secret: i64,

    /// Maximum accepted token age in milliseconds
    pub token_max_age_ms: u64,

    /// Interval between liveness probes per connection
    pub probe_interval_ms: u64,

    /// How long a probe may stay unanswered before the connection is reaped
    pub probe_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 5760,
            shared_secret: 0,
            token_max_age_ms: 3_600_000, // 1 hour
            probe_interval_ms: 30_000,
            probe_timeout_ms: 10_000,
        }
    }
}

/// CLI/environment overrides applied on top of file/default values
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub shared_secret: Option<i64>,
    pub token_max_age_ms: Option<u64>,
    pub probe_interval_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
}

impl GatewayConfig {
    /// Load configuration from an optional TOML file, then apply overrides
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };

        if let Some(port) = overrides.port {
            config.port = port;
        }
        if let Some(secret) = overrides.shared_secret {
            config.shared_secret = secret;
        }
        if let Some(max_age) = overrides.token_max_age_ms {
            config.token_max_age_ms = max_age;
        }
        if let Some(interval) = overrides.probe_interval_ms {
            config.probe_interval_ms = interval;
        }
        if let Some(timeout) = overrides.probe_timeout_ms {
            config.probe_timeout_ms = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML file; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Validate tunable ranges
    pub fn validate(&self) -> Result<()> {
        if self.probe_interval_ms == 0 {
            return Err(Error::Config("probe_interval_ms must be > 0".to_string()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(Error::Config("probe_timeout_ms must be > 0".to_string()));
        }
        if self.token_max_age_ms == 0 {
            return Err(Error::Config("token_max_age_ms must be > 0".to_string()));
        }
        Ok(())
    }
}
