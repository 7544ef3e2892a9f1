//! Application context — unified state passed to every command handler.
//!
//! Built once in `Cli::run()` after configuration is loaded, so command
//! handlers never read files or environment variables themselves.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::FleetConfig;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::OsFs;
use crate::infra::notifier::{AnyNotifier, NullNotifier};
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode, JSON).
    pub output: OutputContext,
    /// Effective configuration: file values with `FLEETOPS_*` overrides.
    pub config: FleetConfig,
    /// Where the configuration was read from.
    pub config_path: PathBuf,
    /// Process runner for host commands.
    pub runner: TokioCommandRunner,
    /// Local filesystem adapter.
    pub fs: OsFs,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags and a config store.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn new(flags: &OutputFlags, store: &impl ConfigStore) -> Result<Self> {
        let config = store.load()?;
        let config_path = store.path();
        tracing::debug!(path = %config_path.display(), ?config, "configuration loaded");
        Ok(Self::from_config(flags, config, config_path))
    }

    /// Construct an `AppContext` around an already-resolved configuration.
    #[must_use]
    pub fn from_config(flags: &OutputFlags, config: FleetConfig, config_path: PathBuf) -> Self {
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet, flags.json),
            config,
            config_path,
            runner: TokioCommandRunner::default(),
            fs: OsFs,
        }
    }

    /// Notifier for the configured webhook. Falls back to dropping
    /// notifications if the HTTP client cannot be built.
    #[must_use]
    pub fn notifier(&self) -> AnyNotifier {
        match AnyNotifier::from_url(self.config.notify.webhook_url.as_deref()) {
            Ok(notifier) => notifier,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "webhook notifier unavailable");
                AnyNotifier::Null(NullNotifier)
            }
        }
    }
}
