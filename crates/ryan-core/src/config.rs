//! Client configuration. Precedence: environment (`RYAN__*`) > file named by
//! `RYAN_CONFIG` (default `config/ryan`) > built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use config::ConfigError;

use crate::logs::DEFAULT_LOG_LIMIT;
use crate::orb::{DecayConfig, RenderConfig};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbConfig {
    #[serde(default)]
    pub decay: DecayConfig,
    #[serde(default)]
    pub render: RenderConfig,
    /// Host frame interval for drivers without a native frame clock.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

fn default_frame_interval_ms() -> u64 {
    16
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the assistant backend (or the proxy in front of it).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_log_limit")]
    pub log_limit: u64,
    #[serde(default = "default_speech_enabled")]
    pub speech_enabled: bool,
    #[serde(default)]
    pub orb: OrbConfig,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_log_limit() -> u64 {
    DEFAULT_LOG_LIMIT
}

fn default_speech_enabled() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            log_limit: default_log_limit(),
            speech_enabled: default_speech_enabled(),
            orb: OrbConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("RYAN_CONFIG").unwrap_or_else(|_| "config/ryan".to_string());
        Self::load_from(&config_path)
    }

    /// Loads from `path` (extension optional) layered under `RYAN__*` variables.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .set_default("log_limit", DEFAULT_LOG_LIMIT as i64)?
            .set_default("speech_enabled", true)?;

        let builder = if Path::new(path).exists() {
            builder.add_source(config::File::from(Path::new(path)))
        } else {
            builder.add_source(config::File::with_name(path).required(false))
        };

        let config: Self = builder
            .add_source(config::Environment::with_prefix("RYAN").separator("__"))
            .build()?
            .try_deserialize()?;
        config.orb.decay.validate().map_err(ConfigError::Message)?;
        Ok(config)
    }
}
