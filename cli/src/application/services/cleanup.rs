//! Application service — file-retention cleanup use-case.

use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use fleetops_common::RunOutcome;

use crate::application::ports::{LocalFs, ProgressReporter};
use crate::domain::{RetentionPolicy, RetentionSummary};

/// Delete (or, under `dry_run`, only count) every file under `dir` whose
/// modification time is older than the policy allows.
///
/// Individual deletion failures are collected in the summary instead of
/// aborting the pass.
///
/// # Errors
///
/// Returns an error if `dir` does not exist or cannot be walked.
pub fn expire_files(
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    dir: &Path,
    policy: RetentionPolicy,
    dry_run: bool,
    now: SystemTime,
) -> Result<RetentionSummary> {
    anyhow::ensure!(fs.exists(dir), "directory {} does not exist", dir.display());

    reporter.step(&format!(
        "Scanning {} for files older than {} days...",
        dir.display(),
        policy.max_age_days
    ));
    let entries = fs
        .list_files(dir)
        .with_context(|| format!("walking {}", dir.display()))?;

    let mut summary = RetentionSummary::new(dir, policy, dry_run);
    summary.scanned = entries.len();
    for entry in entries
        .iter()
        .filter(|e| policy.is_expired(e.modified, now))
    {
        if dry_run {
            tracing::info!(path = %entry.path.display(), "would delete");
        } else if let Err(e) = fs.remove_file(&entry.path) {
            tracing::warn!(path = %entry.path.display(), error = %format!("{e:#}"), "delete failed");
            summary
                .failures
                .push(format!("{}: {e:#}", entry.path.display()));
            continue;
        } else {
            tracing::debug!(path = %entry.path.display(), "deleted");
        }
        summary.removed += 1;
        summary.bytes_removed += entry.len;
    }
    Ok(summary)
}

/// Run one cleanup pass and fold the result into a run outcome.
pub fn cleanup_outcome(
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    dir: &Path,
    policy: RetentionPolicy,
    dry_run: bool,
) -> RunOutcome {
    match expire_files(fs, reporter, dir, policy, dry_run, SystemTime::now()) {
        Ok(summary) => {
            let outcome = summary.outcome();
            if outcome.is_success() {
                reporter.success(&outcome.detail);
            } else {
                reporter.warn(&outcome.detail);
            }
            outcome
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "cleanup failed");
            RunOutcome::error(format!("cleanup failed: {e:#}"))
        }
    }
}
