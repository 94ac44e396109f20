//! User configuration loading for mentionkit.
//!
//! User config location: $XDG_CONFIG_HOME/mentionkit/mentionkit.toml
//! Fallback: the platform config directory from `dirs` (~/.config on Linux)

use super::settings::MentionSettings;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_DIR_NAME: &str = "mentionkit";
pub const CONFIG_FILE_NAME: &str = "mentionkit.toml";

#[derive(Debug, Error)]
pub enum UserConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

pub type UserConfigResult<T> = Result<T, UserConfigError>;

/// Returns the path to the user configuration file.
///
/// The path is determined by:
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/mentionkit/mentionkit.toml
/// 2. Otherwise: `dirs::config_dir()`/mentionkit/mentionkit.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the user config file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_user_config() -> UserConfigResult<Option<MentionSettings>> {
    match user_config_path() {
        Some(path) => load_config_file(&path),
        None => Ok(None),
    }
}

/// Load a config file, returning `Ok(None)` if it does not exist.
pub fn load_config_file(path: &Path) -> UserConfigResult<Option<MentionSettings>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| UserConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| UserConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
