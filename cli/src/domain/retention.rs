//! File-retention rules and the summary reported by the cleanup job.
//!
//! Pure functions only — the filesystem walk lives behind the `LocalFs` port.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use fleetops_common::RunOutcome;

const SECS_PER_DAY: u64 = 86_400;

/// Files older than `max_age_days` are expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age_days: u64,
}

impl RetentionPolicy {
    #[must_use]
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days.saturating_mul(SECS_PER_DAY))
    }

    /// Oldest modification time that is still kept.
    ///
    /// Saturates at the Unix epoch for absurd ages instead of underflowing.
    #[must_use]
    pub fn cutoff(&self, now: SystemTime) -> SystemTime {
        now.checked_sub(self.max_age()).unwrap_or(SystemTime::UNIX_EPOCH)
    }

    #[must_use]
    pub fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        modified < self.cutoff(now)
    }
}

/// Result of one cleanup pass.
#[derive(Debug, Clone, Default)]
pub struct RetentionSummary {
    pub directory: PathBuf,
    pub max_age_days: u64,
    pub dry_run: bool,
    pub scanned: usize,
    pub removed: usize,
    pub bytes_removed: u64,
    /// `path: error` for every file that could not be deleted.
    pub failures: Vec<String>,
}

impl RetentionSummary {
    #[must_use]
    pub fn new(directory: &Path, policy: RetentionPolicy, dry_run: bool) -> Self {
        Self {
            directory: directory.to_path_buf(),
            max_age_days: policy.max_age_days,
            dry_run,
            ..Self::default()
        }
    }

    /// Success when every expired file went away, Warning when some did not.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        let verb = if self.dry_run { "would delete" } else { "deleted" };
        let mut detail = format!(
            "{verb} {} of {} files ({}) older than {} days from {}",
            self.removed,
            self.scanned,
            human_bytes(self.bytes_removed),
            self.max_age_days,
            self.directory.display(),
        );
        if self.failures.is_empty() {
            return RunOutcome::success(detail);
        }
        detail.push_str(&format!("; {} could not be deleted", self.failures.len()));
        if let Some(first) = self.failures.first() {
            detail.push_str(&format!(" (first: {first})"));
        }
        RunOutcome::warning(detail)
    }
}

/// Render a byte count with a binary unit suffix.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut unit = 0;
    let mut whole = bytes;
    let mut rem = 0;
    while whole >= 1024 && unit < UNITS.len() - 1 {
        rem = whole % 1024;
        whole /= 1024;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{whole}.{} {}", rem * 10 / 1024, UNITS[unit])
    }
}
