//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Workflow errors ───────────────────────────────────────────────────────────

/// Fatal conditions that end an agent lifecycle run.
///
/// Every variant is terminal: the workflow runner converts it into an
/// `Error` run outcome whose detail is the `Display` text below.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Bad or missing configuration. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// A network step kept failing until its retry budget ran out.
    #[error("{step} failed after {attempts} attempts: {last}")]
    Transient {
        step: &'static str,
        attempts: u32,
        last: String,
    },

    /// Downloaded bytes do not hash to the catalog value.
    #[error("integrity check failed: expected sha256 {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// Installer, uninstaller or post-install verification failed.
    #[error("{0}")]
    Install(String),
}

impl WorkflowError {
    /// Short machine-readable code used in `--json` output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Config(_) => "config",
            WorkflowError::Transient { .. } => "transient_network",
            WorkflowError::Integrity { .. } => "integrity",
            WorkflowError::Install(_) => "install",
        }
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while validating loaded configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl From<ConfigError> for WorkflowError {
    fn from(err: ConfigError) -> Self {
        WorkflowError::Config(err.to_string())
    }
}
