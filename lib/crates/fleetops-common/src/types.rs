use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a job run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Warning,
    Error,
}

impl RunStatus {
    /// Process exit code for this status. Only `Error` is a failure.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Success | RunStatus::Warning => 0,
            RunStatus::Error => 1,
        }
    }

    /// Short emoji marker used in the webhook text fallback.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            RunStatus::Success => ":white_check_mark:",
            RunStatus::Warning => ":warning:",
            RunStatus::Error => ":x:",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::Warning => "warning",
            RunStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// The single outcome produced by a job run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub detail: String,
}

impl RunOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            detail: detail.into(),
        }
    }

    pub fn warning(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Warning,
            detail: detail.into(),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Which job produced a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Install,
    Uninstall,
    Cleanup,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobKind::Install => "install",
            JobKind::Uninstall => "uninstall",
            JobKind::Cleanup => "cleanup",
        };
        f.write_str(s)
    }
}

/// Identity of the host a job ran on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineIdentity {
    pub hostname: String,
    pub serial_number: String,
    pub os_version: String,
}

impl MachineIdentity {
    /// Placeholder used for any field the host could not report.
    pub const UNKNOWN: &'static str = "unknown";

    #[must_use]
    pub fn unknown() -> Self {
        Self {
            hostname: Self::UNKNOWN.to_string(),
            serial_number: Self::UNKNOWN.to_string(),
            os_version: Self::UNKNOWN.to_string(),
        }
    }
}

/// Webhook payload sent once per run.
///
/// `text` is a plain one-line summary so chat webhooks that only understand
/// `{"text": ...}` still render something useful; the structured fields are
/// for consumers that parse the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub job: JobKind,
    pub status: RunStatus,
    pub detail: String,
    pub host: MachineIdentity,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(
        job: JobKind,
        outcome: &RunOutcome,
        host: MachineIdentity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let text = format!(
            "{} {job} {} on {} ({}, macOS {}): {}",
            outcome.status.marker(),
            outcome.status,
            host.hostname,
            host.serial_number,
            host.os_version,
            outcome.detail,
        );
        Self {
            text,
            job,
            status: outcome.status,
            detail: outcome.detail.clone(),
            host,
            timestamp,
        }
    }
}
