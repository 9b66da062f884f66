mod settings;

pub use settings::{
    Config, ConfigError, TomlAgentConfig, TomlConfig, TomlReplayConfig, TomlRoundTripConfig,
    TomlStatusConfig, EXAMPLE_CONFIG,
};
