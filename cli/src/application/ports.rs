//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `fleetops_common` — never
//! from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use fleetops_common::{MachineIdentity, Notification};

use crate::domain::{ArtifactDescriptor, Credentials, FleetConfig};

// ── Value Types ───────────────────────────────────────────────────────────────

/// What a single download attempt produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    /// HTTP status code of the download response.
    pub status: u16,
    /// Bytes actually written to disk.
    pub bytes_written: u64,
    /// `Content-Length` advertised by the server, when present.
    pub content_length: Option<u64>,
}

impl DownloadReport {
    /// `true` when the body was not cut short of the advertised length.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.content_length
            .is_none_or(|expected| expected == self.bytes_written)
    }
}

/// A regular file found by a directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub len: u64,
    pub modified: SystemTime,
}

// ── Vendor API Port ───────────────────────────────────────────────────────────

/// The endpoint-security vendor's identity, catalog and download API.
///
/// Implementations report every transport failure, empty body, and
/// error-shaped response as `Err`; callers decide whether to retry.
#[allow(async_fn_in_trait)]
pub trait VendorApi {
    /// Exchange client credentials for a bearer token.
    async fn request_token(&self, creds: &Credentials) -> Result<String>;
    /// Revoke a previously issued bearer token.
    async fn revoke_token(&self, creds: &Credentials, token: &str) -> Result<()>;
    /// Look up the newest installer matching `platform_filter` (one result).
    async fn latest_installer(
        &self,
        token: &str,
        platform_filter: &str,
    ) -> Result<ArtifactDescriptor>;
    /// Stream the installer identified by `sha256` into `dest`.
    ///
    /// A non-200 status is returned in the report rather than as `Err`.
    async fn download_installer(
        &self,
        token: &str,
        sha256: &str,
        dest: &Path,
    ) -> Result<DownloadReport>;
    /// Fetch the maintenance token required to uninstall the agent from
    /// `device_id`.
    async fn reveal_uninstall_token(&self, token: &str, device_id: &str) -> Result<String>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Notification Port ─────────────────────────────────────────────────────────

/// Delivers the run outcome to the fleet's chat channel.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Send one notification. Callers treat failures as best-effort.
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Reports identity fields of the machine the job runs on.
#[allow(async_fn_in_trait)]
pub trait HostInspector {
    /// Never fails: unknown fields are filled with a placeholder.
    async fn identity(&self) -> MachineIdentity;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config and Filesystem Ports ───────────────────────────────────────────────

/// Abstracts loading the job configuration.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if no file exists.
    fn load(&self) -> Result<FleetConfig>;
    /// Location of the config file.
    fn path(&self) -> PathBuf;
}

/// Abstracts file hashing operations.
pub trait FileHasher {
    /// Compute the SHA-256 hash of a file.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}

/// Abstracts the raw filesystem operations the jobs need.
pub trait LocalFs {
    /// Whether `path` exists (file, directory, or symlink target).
    fn exists(&self, path: &Path) -> bool;
    /// Remove a single file.
    fn remove_file(&self, path: &Path) -> Result<()>;
    /// Recursively list regular files under `dir` without following symlinks.
    fn list_files(&self, dir: &Path) -> Result<Vec<FileEntry>>;
}
