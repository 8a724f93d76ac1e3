//! Server configuration, read from a RON file.
//!
//! Every field has a default, so a partial file (or no file at all) is valid.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_info, LoggingOptions};
use linkprobe_core::DEFAULT_SCHEME;
use linkprobe_engine::{EngineSettings, FetchSettings, MAX_CONCURRENCY};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the config file when no CLI argument is given.
pub const CONFIG_ENV: &str = "LINKPROBE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub engine: EngineSection,
    pub fetch: FetchSection,
    pub logging: LoggingOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub concurrency: usize,
    pub max_hops: usize,
    pub default_scheme: Option<String>,
    pub throttle_threshold: usize,
    pub throttle_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Overrides the browser-like default user agent.
    pub user_agent: Option<String>,
    pub accept_invalid_certs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            engine: EngineSection::default(),
            fetch: FetchSection::default(),
            logging: LoggingOptions::default(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_hops: 10,
            default_scheme: Some(DEFAULT_SCHEME.to_string()),
            throttle_threshold: 50,
            throttle_delay_ms: 100,
        }
    }
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            user_agent: None,
            accept_invalid_certs: false,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;
        if engine.concurrency == 0 || engine.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::Invalid(format!(
                "engine.concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                engine.concurrency
            )));
        }
        if engine.max_hops == 0 {
            return Err(ConfigError::Invalid("engine.max_hops must be at least 1".into()));
        }
        if self.fetch.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "fetch.request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            concurrency: self.engine.concurrency,
            max_hops: self.engine.max_hops,
            default_scheme: self.engine.default_scheme.clone(),
            throttle_threshold: self.engine.throttle_threshold,
            throttle_delay: Duration::from_millis(self.engine.throttle_delay_ms),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: Duration::from_millis(self.fetch.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.fetch.request_timeout_ms),
            user_agent: self
                .fetch
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            accept_invalid_certs: self.fetch.accept_invalid_certs,
        }
    }
}

/// Picks the config path: explicit CLI argument first, then the environment.
pub fn config_path(cli_arg: Option<String>, env_value: Option<String>) -> Option<PathBuf> {
    cli_arg
        .or(env_value)
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

/// Loads and validates the config; a missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ServerConfig::default());
    };

    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_info!("No config at {:?}; using defaults", path);
            return Ok(ServerConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config: ServerConfig = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}
