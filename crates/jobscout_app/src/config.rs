//! RON configuration for the client.
//!
//! Every field is optional in the file; missing fields take the defaults of
//! the local development service.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jobscout_engine::{ChannelSettings, CommandSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::logging::LogDestination;
use crate::reconnect::{ExponentialBackoff, NeverReconnect, ReconnectPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("`{field}` is not a usable base url ({value}): {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReconnectConfig {
    #[default]
    Never,
    Backoff {
        initial_ms: u64,
        max_ms: u64,
        max_attempts: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub base_url: String,
    pub bulk_base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub bulk_timeout_ms: u64,
    pub max_event_bytes: usize,
    pub reconnect: ReconnectConfig,
    pub log: LogDestination,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        let channel = ChannelSettings::default();
        let commands = CommandSettings::default();
        Self {
            base_url: commands.base_url,
            bulk_base_url: commands.bulk_base_url,
            connect_timeout_ms: millis(commands.connect_timeout),
            request_timeout_ms: millis(commands.request_timeout),
            bulk_timeout_ms: millis(commands.bulk_timeout),
            max_event_bytes: channel.max_event_bytes,
            reconnect: ReconnectConfig::default(),
            log: LogDestination::default(),
        }
    }
}

impl ScoutConfig {
    /// Reads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScoutConfig = ron::from_str(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_base_url("base_url", &self.base_url)?;
        check_base_url("bulk_base_url", &self.bulk_base_url)
    }

    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            max_event_bytes: self.max_event_bytes,
        }
    }

    pub fn command_settings(&self) -> CommandSettings {
        CommandSettings {
            base_url: self.base_url.clone(),
            bulk_base_url: self.bulk_base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            bulk_timeout: Duration::from_millis(self.bulk_timeout_ms),
        }
    }

    pub fn reconnect_policy(&self) -> Box<dyn ReconnectPolicy> {
        match self.reconnect {
            ReconnectConfig::Never => Box::new(NeverReconnect),
            ReconnectConfig::Backoff {
                initial_ms,
                max_ms,
                max_attempts,
            } => Box::new(ExponentialBackoff {
                initial: Duration::from_millis(initial_ms),
                max: Duration::from_millis(max_ms),
                max_attempts,
            }),
        }
    }
}

fn check_base_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) url".to_string()));
    }
    Ok(())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
