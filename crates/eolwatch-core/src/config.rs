//! Layered configuration loading for eolwatch services.
//!
//! Configuration is resolved (highest priority first):
//! 1. Call arguments (applied by the caller after loading)
//! 2. Environment variables (`EOLWATCH__SECTION__KEY`)
//! 3. Config file (`eolwatch.toml`, `.yaml` or `.json`)
//! 4. Serde defaults on each section struct

use serde::de::DeserializeOwned;

use crate::error::Result;

/// Default config file prefix, resolved relative to the working directory.
pub const DEFAULT_FILE_PREFIX: &str = "eolwatch";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "EOLWATCH";

/// Build the file + environment layers. A missing file is not an error.
pub fn layered(file_prefix: &str) -> Result<config::Config> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(cfg)
}

/// Deserialize one section, falling back to its defaults when absent.
///
/// A section that is present but malformed also falls back, with a warning,
/// so a bad override never prevents an audit from running.
pub fn section<T>(cfg: &config::Config, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match cfg.get::<T>(key) {
        Ok(value) => value,
        Err(config::ConfigError::NotFound(_)) => T::default(),
        Err(e) => {
            tracing::warn!(section = key, error = %e, "Invalid config section, using defaults");
            T::default()
        }
    }
}
