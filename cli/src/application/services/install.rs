//! Application service — endpoint agent install workflow.
//!
//! `CheckInstalled → Authenticate → ResolveArtifact → Download → Verify →
//! Install → ConfirmInstalled`, failing into a single `Error` outcome from
//! any stage. Imports only from `crate::domain` and `crate::application`.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fleetops_common::RunOutcome;

use crate::application::ports::{
    CommandRunner, DownloadReport, FileHasher, LocalFs, ProgressReporter, VendorApi,
};
use crate::application::services::retry::with_retry;
use crate::application::services::session::Session;
use crate::application::services::{LifecyclePorts, exit_summary};
use crate::domain::{ArtifactDescriptor, Credentials, FleetConfig, WorkflowError, digests_match};

/// macOS package installer.
pub const INSTALLER_BIN: &str = "/usr/sbin/installer";

const JOB: &str = "install";

/// Stages of the install workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    CheckInstalled,
    Authenticate,
    ResolveArtifact,
    Download,
    Verify,
    Install,
    ConfirmInstalled,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallStage::CheckInstalled => "Checking for an existing installation...",
            InstallStage::Authenticate => "Authenticating with the vendor API...",
            InstallStage::ResolveArtifact => "Resolving the latest installer...",
            InstallStage::Download => "Downloading installer...",
            InstallStage::Verify => "Verifying installer checksum...",
            InstallStage::Install => "Running the package installer...",
            InstallStage::ConfirmInstalled => "Confirming installation...",
        };
        f.write_str(s)
    }
}

/// Downloaded installer on disk. Deleted when dropped, on every exit path.
struct ArtifactFile<'a, F: LocalFs> {
    path: PathBuf,
    fs: &'a F,
}

impl<'a, F: LocalFs> ArtifactFile<'a, F> {
    fn new(path: PathBuf, fs: &'a F) -> Self {
        Self { path, fs }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: LocalFs> Drop for ArtifactFile<'_, F> {
    fn drop(&mut self) {
        if !self.fs.exists(&self.path) {
            return;
        }
        match self.fs.remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed downloaded artifact"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %format!("{e:#}"),
                "failed to remove downloaded artifact"
            ),
        }
    }
}

/// Install the endpoint agent unless it is already present.
///
/// Never fails: every error becomes an `Error` outcome. The session token,
/// once acquired, is revoked exactly once whichever stage the run ends in.
/// The marker check precedes credential validation, so an installed host
/// reports `Success` even when no vendor credentials are configured.
pub async fn install_agent<A, C, F, H, P>(
    ports: &LifecyclePorts<'_, A, C, F, H, P>,
    config: &FleetConfig,
) -> RunOutcome
where
    A: VendorApi,
    C: CommandRunner,
    F: LocalFs,
    H: FileHasher,
    P: ProgressReporter,
{
    ports.enter(JOB, InstallStage::CheckInstalled);
    if ports.fs.exists(&config.install.marker_path) {
        let outcome = RunOutcome::success("agent already installed; nothing to do");
        ports.reporter.success(&outcome.detail);
        return outcome;
    }

    let creds = match config.validate_for_lifecycle() {
        Ok(creds) => creds,
        Err(e) => return failed(&WorkflowError::from(e)),
    };

    let mut session = Session::new();
    let result = run_stages(ports, config, &creds, &mut session).await;
    session.revoke(ports.api, &creds).await;

    match result {
        Ok(outcome) => {
            ports.reporter.success(&outcome.detail);
            outcome
        }
        Err(e) => failed(&e),
    }
}

fn failed(err: &WorkflowError) -> RunOutcome {
    tracing::error!(job = JOB, code = err.code(), error = %err, "install failed");
    RunOutcome::error(err.to_string())
}

async fn run_stages<A, C, F, H, P>(
    ports: &LifecyclePorts<'_, A, C, F, H, P>,
    config: &FleetConfig,
    creds: &Credentials,
    session: &mut Session,
) -> Result<RunOutcome, WorkflowError>
where
    A: VendorApi,
    C: CommandRunner,
    F: LocalFs,
    H: FileHasher,
    P: ProgressReporter,
{
    let install = &config.install;

    ports.enter(JOB, InstallStage::Authenticate);
    let token = with_retry("authentication", config.retry.auth, |_| {
        ports.api.request_token(creds)
    })
    .await?;
    session.hold(&token);

    ports.enter(JOB, InstallStage::ResolveArtifact);
    let artifact = with_retry("installer lookup", config.retry.catalog, |_| {
        ports
            .api
            .latest_installer(&token, &config.vendor.platform_filter)
    })
    .await?;
    tracing::info!(name = %artifact.name, sha256 = %artifact.sha256, "resolved installer");

    ports.enter(JOB, InstallStage::Download);
    let download_dir = install
        .download_dir
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let file = ArtifactFile::new(download_dir.join(artifact.local_filename()), ports.fs);
    let downloaded = with_retry("download", config.retry.download, |_| {
        download_once(ports.api, &token, &artifact, file.path())
    })
    .await;
    // Later stages are local; the credential does not need to outlive the download.
    session.revoke(ports.api, creds).await;
    let report = downloaded?;
    tracing::info!(bytes = report.bytes_written, "installer downloaded");

    ports.enter(JOB, InstallStage::Verify);
    let actual = ports
        .hasher
        .sha256_file(file.path())
        .map_err(|e| WorkflowError::Integrity {
            expected: artifact.sha256.clone(),
            actual: format!("<unreadable: {e:#}>"),
        })?;
    if !digests_match(&artifact.sha256, &actual) {
        return Err(WorkflowError::Integrity {
            expected: artifact.sha256.clone(),
            actual,
        });
    }

    ports.enter(JOB, InstallStage::Install);
    let pkg = file.path().to_string_lossy().into_owned();
    let ran = ports
        .runner
        .run_with_timeout(
            INSTALLER_BIN,
            &["-pkg", &pkg, "-target", "/"],
            install.installer_timeout(),
        )
        .await;
    drop(file);
    let output = ran.map_err(|e| WorkflowError::Install(format!("could not run installer: {e:#}")))?;
    if !output.status.success() {
        return Err(WorkflowError::Install(format!(
            "installer failed: {}",
            exit_summary(&output)
        )));
    }

    if let Some(cid) = config.vendor.customer_id.as_deref() {
        license_sensor(ports.runner, &install.agent_ctl_path, cid).await?;
    }

    ports.enter(JOB, InstallStage::ConfirmInstalled);
    if !ports.fs.exists(&install.marker_path) {
        return Err(WorkflowError::Install(format!(
            "verification failed after apparently successful install: {} is missing",
            install.marker_path.display()
        )));
    }

    Ok(RunOutcome::success(format!(
        "installed {} (sha256 {})",
        artifact.name, artifact.sha256
    )))
}

/// One download attempt. Non-200 and short bodies are failed attempts.
async fn download_once(
    api: &impl VendorApi,
    token: &str,
    artifact: &ArtifactDescriptor,
    dest: &Path,
) -> anyhow::Result<DownloadReport> {
    let report = api
        .download_installer(token, &artifact.sha256, dest)
        .await
        .context("download request failed")?;
    anyhow::ensure!(
        report.status == 200,
        "unexpected HTTP status {}",
        report.status
    );
    anyhow::ensure!(
        report.is_complete(),
        "truncated download: {} of {} bytes",
        report.bytes_written,
        report.content_length.unwrap_or_default()
    );
    Ok(report)
}

async fn license_sensor(
    runner: &impl CommandRunner,
    agent_ctl: &Path,
    customer_id: &str,
) -> Result<(), WorkflowError> {
    let ctl = agent_ctl.to_string_lossy();
    let output = runner
        .run(&ctl, &["license", customer_id])
        .await
        .map_err(|e| WorkflowError::Install(format!("could not run falconctl license: {e:#}")))?;
    if !output.status.success() {
        return Err(WorkflowError::Install(format!(
            "sensor licensing failed: {}",
            exit_summary(&output)
        )));
    }
    Ok(())
}
