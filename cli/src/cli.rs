//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleetops_common::{JobKind, RunStatus};

use crate::app::{AppContext, OutputFlags};
use crate::application::ports::ConfigStore;
use crate::commands;
use crate::infra::config::{YamlConfigStore, env_only_config};

/// Endpoint agent lifecycle and housekeeping jobs for managed Macs
#[derive(Parser)]
#[command(
    name = "fleetops",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log debug detail to stderr (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(long, global = true, env = "FLEETOPS_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install the endpoint agent if it is not already installed
    Install,

    /// Remove the endpoint agent
    Uninstall,

    /// Delete files older than the retention window
    Cleanup(commands::cleanup::CleanupArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command and return the job's terminal status.
    ///
    /// A config file that cannot be loaded fails the job like any other
    /// error: the outcome is rendered and notified using `FLEETOPS_*`
    /// environment settings alone.
    ///
    /// # Errors
    ///
    /// Returns an error only if the outcome cannot be rendered. Job failures
    /// are reported through the returned status, not as errors.
    pub async fn run(self) -> Result<RunStatus> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            config,
            command,
        } = self;

        let job = match &command {
            Command::Version => {
                commands::version::run(json);
                return Ok(RunStatus::Success);
            }
            Command::Install => JobKind::Install,
            Command::Uninstall => JobKind::Uninstall,
            Command::Cleanup(_) => JobKind::Cleanup,
        };

        let flags = OutputFlags {
            no_color,
            quiet,
            json,
        };
        let store = YamlConfigStore::new(config);
        let app = match AppContext::new(&flags, &store) {
            Ok(app) => app,
            Err(e) => {
                tracing::error!(%job, error = %format!("{e:#}"), "configuration could not be loaded");
                let fallback = AppContext::from_config(&flags, env_only_config(), store.path());
                let outcome = commands::config_failure::run(&fallback, job, &e).await?;
                return Ok(outcome.status);
            }
        };

        let outcome = match command {
            Command::Install => commands::install::run(&app).await?,
            Command::Uninstall => commands::uninstall::run(&app).await?,
            Command::Cleanup(args) => commands::cleanup::run(&app, &args).await?,
            Command::Version => return Ok(RunStatus::Success),
        };
        Ok(outcome.status)
    }
}
