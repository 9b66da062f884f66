//! Locations under the replayer data directory

use std::path::PathBuf;

/// Base data directory (~/.replayer), relative to the working directory when
/// no home directory is known
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".replayer"))
        .unwrap_or_else(|| PathBuf::from(".replayer"))
}

/// Default config file (~/.replayer/config.toml)
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}
