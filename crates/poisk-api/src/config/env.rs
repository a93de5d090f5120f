//! Config loading from environment variables

use std::net::SocketAddr;
use std::path::PathBuf;

use poisk::PoiskConfig;

use super::constants::{BIND_ADDR_ENV, CONFIG_PATH_ENV, DEFAULT_BIND_ADDR, DEFAULT_CONFIG_PATH};
use crate::errors::ApiError;

/// API Server Configuration
#[derive(Debug, Clone)]
pub struct Config {
  /// Bind address (e.g. "127.0.0.1:8080")
  pub bind_addr: String,
  /// Path of the poisk TOML configuration
  pub config_path: PathBuf,
}

impl Config {
  /// Loads configuration from environment variables
  ///
  /// # Errors
  /// Returns an error if environment variable values are invalid
  pub fn from_env() -> crate::errors::Result<Self> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Loads configuration through `lookup`, which maps a variable name to its value
  ///
  /// # Errors
  /// Returns an error if the bind address is not a socket address
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::errors::Result<Self> {
    let bind_addr = lookup(BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    bind_addr.parse::<SocketAddr>().map_err(|e| {
      ApiError::config(format!("{BIND_ADDR_ENV} is not a socket address ({bind_addr}): {e}"))
    })?;

    let config_path =
      PathBuf::from(lookup(CONFIG_PATH_ENV).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()));

    Ok(Self {
      bind_addr,
      config_path,
    })
  }

  /// Reads and validates the poisk configuration file
  ///
  /// # Errors
  /// Returns a config error if the file is missing, malformed or invalid
  pub fn load_poisk_config(&self) -> crate::errors::Result<PoiskConfig> {
    let config = PoiskConfig::from_file(&self.config_path)?;
    config.validate()?;
    Ok(config)
  }
}
