use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::replay::{
    EngineTimings, ReplayOptions, DEFAULT_CLICK_ROUND_TRIP, DEFAULT_INPUT_ROUND_TRIP,
    DEFAULT_LOAD_POLL, DEFAULT_MAX_STEP_DELAY, DEFAULT_NAVIGATION_TIMEOUT, DEFAULT_PAUSE_POLL,
    DEFAULT_SPEED, DEFAULT_STATUS_CAPACITY,
};
use crate::resolver::{
    ResolutionAgent, DEFAULT_CLICK_TIMEOUT, DEFAULT_INPUT_TIMEOUT, DEFAULT_POLL_INTERVAL,
};
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Replay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Default pacing for runs that do not override it
    pub replay: ReplayOptions,
    /// Waits and deadlines used by every session
    pub timings: EngineTimings,
    /// Agent polling interval while an element is not yet resolvable
    pub agent_poll_interval: Duration,
    /// Capacity of the status broadcast channel
    pub status_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replay: ReplayOptions {
                speed: DEFAULT_SPEED,
                max_step_delay: DEFAULT_MAX_STEP_DELAY,
            },
            timings: EngineTimings {
                pause_poll: DEFAULT_PAUSE_POLL,
                load_poll: DEFAULT_LOAD_POLL,
                navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
                click_timeout: DEFAULT_CLICK_TIMEOUT,
                input_timeout: DEFAULT_INPUT_TIMEOUT,
                click_round_trip: DEFAULT_CLICK_ROUND_TRIP,
                input_round_trip: DEFAULT_INPUT_ROUND_TRIP,
            },
            agent_poll_interval: DEFAULT_POLL_INTERVAL,
            status_capacity: DEFAULT_STATUS_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlReplayConfig {
    pub speed: Option<f64>,
    pub max_step_delay_ms: Option<u64>,
    pub pause_poll_ms: Option<u64>,
    pub load_poll_ms: Option<u64>,
    pub navigation_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlAgentConfig {
    pub poll_interval_ms: Option<u64>,
    pub click_timeout_ms: Option<u64>,
    pub input_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlRoundTripConfig {
    pub click_ms: Option<u64>,
    pub input_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlStatusConfig {
    pub channel_capacity: Option<usize>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub replay: Option<TomlReplayConfig>,
    pub agent: Option<TomlAgentConfig>,
    pub round_trip: Option<TomlRoundTripConfig>,
    pub status: Option<TomlStatusConfig>,
}

fn set_ms(target: &mut Duration, value: Option<u64>) {
    if let Some(ms) = value {
        *target = Duration::from_millis(ms);
    }
}

impl Config {
    /// Load configuration, merging the file over defaults.
    ///
    /// An explicit `path` must exist. Without one, `~/.replayer/config.toml`
    /// is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = config_path();
                if !default.exists() {
                    tracing::debug!(path = %default.display(), "No config file; using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let toml_config = toml::from_str::<TomlConfig>(&contents)
            .map_err(|source| ConfigError::Parse { path, source })?;
        Self::from_toml(toml_config)
    }

    pub fn from_toml(toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(replay) = toml_config.replay {
            if let Some(speed) = replay.speed {
                config.replay.speed = speed;
            }
            set_ms(&mut config.replay.max_step_delay, replay.max_step_delay_ms);
            set_ms(&mut config.timings.pause_poll, replay.pause_poll_ms);
            set_ms(&mut config.timings.load_poll, replay.load_poll_ms);
            set_ms(&mut config.timings.navigation_timeout, replay.navigation_timeout_ms);
        }

        if let Some(agent) = toml_config.agent {
            set_ms(&mut config.agent_poll_interval, agent.poll_interval_ms);
            set_ms(&mut config.timings.click_timeout, agent.click_timeout_ms);
            set_ms(&mut config.timings.input_timeout, agent.input_timeout_ms);
        }

        if let Some(round_trip) = toml_config.round_trip {
            set_ms(&mut config.timings.click_round_trip, round_trip.click_ms);
            set_ms(&mut config.timings.input_round_trip, round_trip.input_ms);
        }

        if let Some(status) = toml_config.status {
            if let Some(capacity) = status.channel_capacity {
                config.status_capacity = capacity;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.replay.speed.is_finite() && self.replay.speed > 0.0) {
            return Err(ConfigError::Invalid {
                key: "replay.speed",
                reason: format!("must be a positive number, got {}", self.replay.speed),
            });
        }
        if self.timings.pause_poll.is_zero() {
            return Err(ConfigError::Invalid {
                key: "replay.pause_poll_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.agent_poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "agent.poll_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.status_capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "status.channel_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn agent(&self) -> ResolutionAgent {
        ResolutionAgent::new(self.agent_poll_interval)
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.replay.speed = speed;
        self
    }

    pub fn with_max_step_delay(mut self, delay: Duration) -> Self {
        self.replay.max_step_delay = delay;
        self
    }
}
