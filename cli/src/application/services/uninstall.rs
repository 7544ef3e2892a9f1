//! Application service — endpoint agent uninstall workflow.
//!
//! The agent is tamper-protected, so removal needs a per-device maintenance
//! token from the vendor API. The token is handed to `falconctl` on stdin.

use std::fmt;

use fleetops_common::RunOutcome;

use crate::application::ports::{
    CommandRunner, FileHasher, LocalFs, ProgressReporter, VendorApi,
};
use crate::application::services::retry::with_retry;
use crate::application::services::session::Session;
use crate::application::services::{LifecyclePorts, exit_summary};
use crate::domain::agent::{parse_agent_id, system_extension_listed};
use crate::domain::{Credentials, FleetConfig, WorkflowError};

/// Lists system extensions and their activation state.
pub const SYSTEMEXTENSIONSCTL_BIN: &str = "/usr/bin/systemextensionsctl";

const JOB: &str = "uninstall";

/// Stages of the uninstall workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallStage {
    CheckInstalled,
    ReadAgentId,
    Authenticate,
    RevealMaintenanceToken,
    Uninstall,
    ConfirmRemoved,
}

impl fmt::Display for UninstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UninstallStage::CheckInstalled => "Checking for an existing installation...",
            UninstallStage::ReadAgentId => "Reading the agent ID...",
            UninstallStage::Authenticate => "Authenticating with the vendor API...",
            UninstallStage::RevealMaintenanceToken => "Requesting the maintenance token...",
            UninstallStage::Uninstall => "Uninstalling the agent...",
            UninstallStage::ConfirmRemoved => "Confirming removal...",
        };
        f.write_str(s)
    }
}

/// Remove the endpoint agent if it is installed.
///
/// Never fails: every error becomes an `Error` outcome. A leftover system
/// extension after a successful removal yields a `Warning`. A host without
/// the agent reports `Success` before any credential is validated.
pub async fn uninstall_agent<A, C, F, H, P>(
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
    ports.enter(JOB, UninstallStage::CheckInstalled);
    if !ports.fs.exists(&config.install.marker_path) {
        let outcome = RunOutcome::success("agent not installed; nothing to do");
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
            if outcome.is_success() {
                ports.reporter.success(&outcome.detail);
            } else {
                ports.reporter.warn(&outcome.detail);
            }
            outcome
        }
        Err(e) => failed(&e),
    }
}

fn failed(err: &WorkflowError) -> RunOutcome {
    tracing::error!(job = JOB, code = err.code(), error = %err, "uninstall failed");
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
    let ctl = install.agent_ctl_path.to_string_lossy().into_owned();

    ports.enter(JOB, UninstallStage::ReadAgentId);
    let stats = ports
        .runner
        .run(&ctl, &["stats", "agent_info"])
        .await
        .map_err(|e| WorkflowError::Install(format!("could not run falconctl stats: {e:#}")))?;
    let device_id = parse_agent_id(&String::from_utf8_lossy(&stats.stdout)).ok_or_else(|| {
        WorkflowError::Install(format!(
            "could not read the agent ID from falconctl stats ({})",
            exit_summary(&stats)
        ))
    })?;
    tracing::info!(%device_id, "agent ID read");

    ports.enter(JOB, UninstallStage::Authenticate);
    let token = with_retry("authentication", config.retry.auth, |_| {
        ports.api.request_token(creds)
    })
    .await?;
    session.hold(&token);

    ports.enter(JOB, UninstallStage::RevealMaintenanceToken);
    let maintenance_token = with_retry("maintenance token lookup", config.retry.catalog, |_| {
        ports.api.reveal_uninstall_token(&token, &device_id)
    })
    .await?;

    ports.enter(JOB, UninstallStage::Uninstall);
    let stdin = format!("{maintenance_token}\n");
    let ran = ports
        .runner
        .run_with_stdin(&ctl, &["uninstall", "--maintenance-token"], stdin.as_bytes())
        .await;
    session.revoke(ports.api, creds).await;
    let output =
        ran.map_err(|e| WorkflowError::Install(format!("could not run falconctl uninstall: {e:#}")))?;
    if !output.status.success() {
        return Err(WorkflowError::Install(format!(
            "uninstall failed: {}",
            exit_summary(&output)
        )));
    }

    ports.enter(JOB, UninstallStage::ConfirmRemoved);
    if ports.fs.exists(&install.marker_path) {
        return Err(WorkflowError::Install(format!(
            "verification failed after apparently successful uninstall: {} is still present",
            install.marker_path.display()
        )));
    }

    match ports.runner.run(SYSTEMEXTENSIONSCTL_BIN, &["list"]).await {
        Ok(list)
            if system_extension_listed(
                &String::from_utf8_lossy(&list.stdout),
                &install.system_extension,
            ) =>
        {
            Ok(RunOutcome::warning(format!(
                "agent removed; reboot required to unload system extension {}",
                install.system_extension
            )))
        }
        Ok(_) => Ok(RunOutcome::success("agent removed")),
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "could not list system extensions");
            Ok(RunOutcome::success("agent removed"))
        }
    }
}
