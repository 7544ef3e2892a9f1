//! Infrastructure implementation of the `ConfigStore` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::{EnvOverrides, FleetConfig};

/// System-wide configuration file, managed by the MDM profile.
pub const DEFAULT_CONFIG_PATH: &str = "/Library/Application Support/fleetops/config.yaml";

/// Prefix for environment overrides (`FLEETOPS_CLIENT_ID`, ...).
pub const ENV_PREFIX: &str = "FLEETOPS_";

/// Production `ConfigStore`: a YAML file on disk with `FLEETOPS_*`
/// environment variables layered on top.
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    /// Use `path` when given, otherwise the system-wide default.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<FleetConfig> {
        let file = read_config_file(&self.path)?;
        let overrides = load_env_overrides()?;
        Ok(file.with_overrides(overrides))
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Parse the YAML file at `path`. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_config_file(path: &Path) -> Result<FleetConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found; using defaults");
        return Ok(FleetConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(FleetConfig::default());
    }
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Read `FLEETOPS_*` overrides from the process environment.
///
/// # Errors
///
/// Returns an error if a variable is present but not valid unicode.
pub fn load_env_overrides() -> Result<EnvOverrides> {
    envy::prefixed(ENV_PREFIX)
        .from_env::<EnvOverrides>()
        .context("cannot read FLEETOPS_* environment variables")
}

/// Defaults with `FLEETOPS_*` overrides, ignoring the config file.
///
/// Used to report a job whose config file could not be loaded, so a webhook
/// set in the environment still hears about it.
#[must_use]
pub fn env_only_config() -> FleetConfig {
    match load_env_overrides() {
        Ok(env) => FleetConfig::default().with_overrides(env),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "ignoring FLEETOPS_* environment");
            FleetConfig::default()
        }
    }
}
