//! Configuration file resolution
//!
//! The service reads at most one TOML file. A file the operator named (the
//! `--config` flag or the `HAWAII_CLIMATE_CONFIG`-style env var) must load;
//! a file merely found in a standard location is skipped with a warning
//! when it cannot be read or parsed, and defaults apply.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::APP_NAME;

/// Where the configuration file came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Named on the command line
    Flag(PathBuf),
    /// Named by the config env var
    Environment(PathBuf),
    /// Found in the working directory, XDG config home or /etc
    Discovered(PathBuf),
    /// No file, built-in defaults only
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Flag(p) | ConfigSource::Environment(p) | ConfigSource::Discovered(p) => {
                Some(p)
            }
            ConfigSource::Defaults => None,
        }
    }

    /// Whether the operator asked for this file, so failing to load it is fatal
    pub fn is_required(&self) -> bool {
        matches!(self, ConfigSource::Flag(_) | ConfigSource::Environment(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// A parsed config file plus what happened while looking for it
#[derive(Debug)]
pub struct LoadedConfig<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Set when a discovered file was skipped
    pub skipped: Option<ConfigError>,
}

/// Pick the config file: `flag`, then `env_var`, then `filename` in the working
/// directory, `$XDG_CONFIG_HOME/hawaii-climate/` and `/etc/hawaii-climate/`.
pub fn find_config_file(flag: Option<&str>, env_var: &str, filename: &str) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource::Flag(PathBuf::from(path));
    }

    if let Some(path) = env::var_os(env_var).filter(|p| !p.is_empty()) {
        return ConfigSource::Environment(PathBuf::from(path));
    }

    [
        PathBuf::from(filename),
        xdg_config_dir().join(APP_NAME).join(filename),
        PathBuf::from("/etc").join(APP_NAME).join(filename),
    ]
    .into_iter()
    .find(|candidate| candidate.is_file())
    .map(ConfigSource::Discovered)
    .unwrap_or(ConfigSource::Defaults)
}

fn xdg_config_dir() -> PathBuf {
    env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `source` into `T`.
///
/// Errors only for required sources; a broken discovered file falls back to
/// `T::default()` and is reported through [`LoadedConfig::skipped`].
pub fn load_config<T: DeserializeOwned + Default>(
    source: ConfigSource,
) -> Result<LoadedConfig<T>, ConfigError> {
    let Some(path) = source.path() else {
        return Ok(LoadedConfig {
            value: T::default(),
            source,
            skipped: None,
        });
    };

    match parse_file(path) {
        Ok(value) => Ok(LoadedConfig {
            value,
            source,
            skipped: None,
        }),
        Err(err) if source.is_required() => Err(err),
        Err(err) => Ok(LoadedConfig {
            value: T::default(),
            source: ConfigSource::Defaults,
            skipped: Some(err),
        }),
    }
}
