//! `fleetops cleanup` — delete files older than the retention window.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fleetops_common::{JobKind, RunOutcome};

use crate::app::AppContext;
use crate::application::services::cleanup::cleanup_outcome;
use crate::application::services::report::run_job;
use crate::domain::RetentionPolicy;
use crate::domain::config::CleanupConfig;
use crate::infra::host::MacHost;
use crate::output::TerminalReporter;

/// Arguments for the cleanup command. Each flag overrides the matching
/// `cleanup.*` config value.
#[derive(Args, Debug, Default)]
pub struct CleanupArgs {
    /// Directory to clean
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Delete files whose modification time is older than this many days
    #[arg(long, value_name = "DAYS")]
    pub max_age_days: Option<u64>,

    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanupArgs {
    /// Merge flags over the configured defaults.
    #[must_use]
    pub fn resolve(&self, config: &CleanupConfig) -> (Option<PathBuf>, RetentionPolicy, bool) {
        let dir = self.dir.clone().or_else(|| config.directory.clone());
        let policy = RetentionPolicy {
            max_age_days: self.max_age_days.unwrap_or(config.max_age_days),
        };
        (dir, policy, self.dry_run || config.dry_run)
    }
}

/// Run the cleanup job and report its outcome.
///
/// # Errors
///
/// Returns an error only if the outcome cannot be rendered.
pub async fn run(app: &AppContext, args: &CleanupArgs) -> Result<RunOutcome> {
    let reporter = TerminalReporter::new(&app.output);
    let notifier = app.notifier();
    let host = MacHost::new(&app.runner);
    let (dir, policy, dry_run) = args.resolve(&app.config.cleanup);

    let outcome = run_job(JobKind::Cleanup, &notifier, &host, async {
        match dir {
            Some(dir) => cleanup_outcome(&app.fs, &reporter, &dir, policy, dry_run),
            None => RunOutcome::error(
                "no cleanup directory configured (set cleanup.directory or pass --dir)",
            ),
        }
    })
    .await;

    app.output.outcome(JobKind::Cleanup, &outcome)?;
    Ok(outcome)
}
