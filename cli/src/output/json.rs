//! JSON output helpers for `--json` mode.
//!
//! Every job prints exactly one object to stdout when it finishes.

use anyhow::{Context, Result};
use fleetops_common::{JobKind, RunOutcome};

/// Format a finished job as a JSON object.
///
/// ```json
/// {
///   "job": "install",
///   "status": "success",
///   "detail": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_outcome(job: JobKind, outcome: &RunOutcome) -> Result<String> {
    let obj = serde_json::json!({
        "job": job,
        "status": outcome.status,
        "detail": outcome.detail,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format a JSON error object for failures that happen before a job runs
/// (unreadable config, bad arguments).
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
