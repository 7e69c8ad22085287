//! Hawaii Climate Core Library
//!
//! Shared utilities for the climate query service:
//! - Configuration file resolution
//! - File system predicates
//! - Application defaults

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigError, ConfigSource, LoadedConfig};
pub use fs::is_file;

/// Application name used for XDG and /etc config paths
pub const APP_NAME: &str = "hawaii-climate";

/// Default service port
pub const DEFAULT_PORT: u16 = 5000;

/// Relative location of the pre-loaded observation dataset
pub const DEFAULT_DATABASE_PATH: &str = "Resources/hawaii.sqlite";
