//! Server configuration loading
//!
//! Settings come from a TOML file, then the `PORT` environment variable
//! overrides the listen port.

use std::io;
use std::path::{Path, PathBuf};

use boardroom_net::ServerConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "BOARDROOM_CONFIG";

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Read from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "boardroom.toml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error(transparent)]
    Invalid(#[from] boardroom_net::Error),
}

/// Load configuration from the process environment
pub fn load() -> Result<ServerConfig, ConfigError> {
    let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let port = std::env::var(PORT_ENV).ok();
    load_from(path.as_deref(), port.as_deref())
}

/// Load configuration from an explicit file and port override.
///
/// An explicit path must exist. Without one, the default file is read
/// if present and built-in defaults are used otherwise.
pub fn load_from(path: Option<&Path>, port: Option<&str>) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                read_file(default)?
            } else {
                ServerConfig::default()
            }
        }
    };

    if let Some(port) = port {
        config.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port.to_string()))?;
    }

    config.validate()?;
    tracing::debug!(?config, "Configuration loaded");
    Ok(config)
}

fn read_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
