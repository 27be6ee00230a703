//! Configuration management for the entropyd server

use crate::aggregator::Tunables;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Server configuration, loaded from `ENTROPY_`-prefixed environment
/// variables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address for the entropy listener
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Bits credited per contributing mouse sample
    #[serde(default = "default_mouse_bits")]
    pub mouse_bits_per_sample: f64,

    /// Bits credited per contributing key sample
    #[serde(default = "default_key_bits")]
    pub key_bits_per_sample: f64,

    /// Minimum interval between contributing samples, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            mouse_bits_per_sample: default_mouse_bits(),
            key_bits_per_sample: default_key_bits(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config: Self = envy::prefixed("ENTROPY_")
            .from_env()
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if self.mouse_bits_per_sample <= 0.0 {
            return Err(Error::Config(
                "mouse_bits_per_sample must be > 0".to_string(),
            ));
        }

        if self.key_bits_per_sample <= 0.0 {
            return Err(Error::Config("key_bits_per_sample must be > 0".to_string()));
        }

        Ok(())
    }

    /// Parsed bind address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_address
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen_address: {}", e)))
    }

    /// Estimator parameters derived from this configuration
    pub fn tunables(&self) -> Tunables {
        Tunables {
            mouse_bits_per_sample: self.mouse_bits_per_sample,
            key_bits_per_sample: self.key_bits_per_sample,
            debounce_ms: self.debounce_ms,
        }
    }
}

// Default value functions
fn default_listen_address() -> String {
    format!("0.0.0.0:{}", crate::DEFAULT_PORT)
}

fn default_mouse_bits() -> f64 {
    1.5
}

fn default_key_bits() -> f64 {
    1.0
}

fn default_debounce_ms() -> u32 {
    100
}
