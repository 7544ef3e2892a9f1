//! Domain types and validators for fleetops configuration.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_BASE_URL: &str = "https://api.crowdstrike.com";
pub const DEFAULT_PLATFORM_FILTER: &str = "platform:\"mac\"";
pub const DEFAULT_MARKER_PATH: &str = "/Applications/Falcon.app/Contents/Resources/falconctl";
pub const DEFAULT_SYSTEM_EXTENSION: &str = "com.crowdstrike.falcon.Agent";
pub const DEFAULT_INSTALLER_TIMEOUT_SECS: u64 = 900;
pub const DEFAULT_MAX_AGE_DAYS: u64 = 30;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration, read from the YAML config file and then
/// overlaid with `FLEETOPS_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FleetConfig {
    pub vendor: VendorConfig,
    pub notify: NotifyConfig,
    pub install: InstallConfig,
    pub retry: RetryConfig,
    pub cleanup: CleanupConfig,
}

/// Vendor API endpoint and credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VendorConfig {
    /// API base URL, e.g. `https://api.us-2.crowdstrike.com`.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Customer ID used to license the sensor after install.
    pub customer_id: Option<String>,
    /// Catalog filter selecting the installer platform.
    pub platform_filter: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            customer_id: None,
            platform_filter: DEFAULT_PLATFORM_FILTER.to_string(),
        }
    }
}

impl fmt::Debug for VendorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VendorConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("customer_id", &self.customer_id)
            .field("platform_filter", &self.platform_filter)
            .finish()
    }
}

/// Chat webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct NotifyConfig {
    /// Incoming-webhook URL. No notification is sent when unset.
    pub webhook_url: Option<String>,
}

/// Local paths and timeouts for the install and uninstall jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    /// Path whose presence means the agent is installed.
    pub marker_path: PathBuf,
    /// Agent control binary (`falconctl`).
    pub agent_ctl_path: PathBuf,
    /// Directory the installer package is downloaded into. Defaults to the
    /// system temp directory.
    pub download_dir: Option<PathBuf>,
    /// Bundle identifier of the agent's system extension.
    pub system_extension: String,
    /// Kill the platform installer after this many seconds.
    pub installer_timeout_secs: u64,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            marker_path: PathBuf::from(DEFAULT_MARKER_PATH),
            agent_ctl_path: PathBuf::from(DEFAULT_MARKER_PATH),
            download_dir: None,
            system_extension: DEFAULT_SYSTEM_EXTENSION.to_string(),
            installer_timeout_secs: DEFAULT_INSTALLER_TIMEOUT_SECS,
        }
    }
}

impl InstallConfig {
    #[must_use]
    pub fn installer_timeout(&self) -> Duration {
        Duration::from_secs(self.installer_timeout_secs)
    }
}

/// Bounded retry budget for one network step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Fixed wait between attempts, in seconds.
    pub backoff_secs: u64,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(attempts: u32, backoff_secs: u64) -> Self {
        Self {
            attempts,
            backoff_secs,
        }
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

/// Retry budgets per network step.
///
/// Authentication and catalog lookups are cheap and fail fast on
/// misconfiguration; downloads get a deeper budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub auth: RetryPolicy,
    pub catalog: RetryPolicy,
    pub download: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            auth: RetryPolicy::new(3, 3),
            catalog: RetryPolicy::new(3, 3),
            download: RetryPolicy::new(10, 5),
        }
    }
}

/// File-retention job settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CleanupConfig {
    pub directory: Option<PathBuf>,
    pub max_age_days: u64,
    pub dry_run: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            dry_run: false,
        }
    }
}

/// `FLEETOPS_*` environment overrides. Secrets normally arrive this way so
/// they never sit in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub customer_id: Option<String>,
    pub webhook_url: Option<String>,
}

impl FleetConfig {
    /// Apply environment overrides on top of file values. Empty values are
    /// ignored so an exported-but-blank variable does not wipe the file.
    #[must_use]
    pub fn with_overrides(mut self, env: EnvOverrides) -> Self {
        fn pick(target: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                *target = v;
            }
        }
        pick(&mut self.vendor.base_url, env.base_url);
        pick(&mut self.vendor.client_id, env.client_id);
        pick(&mut self.vendor.client_secret, env.client_secret);
        if let Some(cid) = env.customer_id.filter(|v| !v.trim().is_empty()) {
            self.vendor.customer_id = Some(cid);
        }
        if let Some(url) = env.webhook_url.filter(|v| !v.trim().is_empty()) {
            self.notify.webhook_url = Some(url);
        }
        self
    }

    /// Check everything the install/uninstall jobs need before the first
    /// network call and hand back the credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first missing or invalid setting.
    pub fn validate_for_lifecycle(&self) -> Result<Credentials, ConfigError> {
        let vendor = &self.vendor;
        if vendor.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("vendor.client_id"));
        }
        if vendor.client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("vendor.client_secret"));
        }
        validate_url("vendor.base_url", &vendor.base_url)?;
        if let Some(url) = &self.notify.webhook_url {
            validate_url("notify.webhook_url", url)?;
        }
        for (key, policy) in [
            ("retry.auth.attempts", self.retry.auth),
            ("retry.catalog.attempts", self.retry.catalog),
            ("retry.download.attempts", self.retry.download),
        ] {
            if policy.attempts == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(Credentials {
            client_id: vendor.client_id.trim().to_string(),
            client_secret: vendor.client_secret.trim().to_string(),
        })
    }
}

fn validate_url(key: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: format!("'{url}' is not an http(s) URL"),
        })
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// OAuth client credentials. Consumed once per run to obtain a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
