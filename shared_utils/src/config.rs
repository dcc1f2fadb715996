use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env::{MissingEnvVarError, get_optional_env_var};

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// The config file could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reads a config file into a string, keeping the path in the error.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<String, ConfigError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves a config path: the explicit value wins, then the environment
/// variable `env_name`.
pub fn resolve_config_path(
    explicit: Option<&str>,
    env_name: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(p) = explicit {
        return Ok(PathBuf::from(p));
    }
    get_optional_env_var(env_name)
        .map(PathBuf::from)
        .ok_or_else(|| MissingEnvVarError(env_name.to_string()).into())
}
