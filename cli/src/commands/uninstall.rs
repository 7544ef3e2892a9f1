//! `fleetops uninstall` — remove the endpoint agent if it is present.

use anyhow::Result;
use fleetops_common::{JobKind, RunOutcome};

use crate::app::AppContext;
use crate::application::services::LifecyclePorts;
use crate::application::services::report::run_job;
use crate::application::services::uninstall::uninstall_agent;
use crate::infra::host::MacHost;
use crate::infra::vendor::FalconApi;
use crate::output::TerminalReporter;

/// Run the uninstall job and report its outcome.
///
/// # Errors
///
/// Returns an error only if the outcome cannot be rendered.
pub async fn run(app: &AppContext) -> Result<RunOutcome> {
    let reporter = TerminalReporter::new(&app.output);
    let notifier = app.notifier();
    let host = MacHost::new(&app.runner);

    let outcome = run_job(JobKind::Uninstall, &notifier, &host, async {
        let api = match FalconApi::new(&app.config.vendor.base_url) {
            Ok(api) => api,
            Err(e) => return RunOutcome::error(format!("{e:#}")),
        };
        let ports = LifecyclePorts {
            api: &api,
            runner: &app.runner,
            fs: &app.fs,
            hasher: &app.fs,
            reporter: &reporter,
        };
        uninstall_agent(&ports, &app.config).await
    })
    .await;

    app.output.outcome(JobKind::Uninstall, &outcome)?;
    Ok(outcome)
}
