//! `fleetops install` — install the endpoint agent if it is missing.

use anyhow::Result;
use fleetops_common::{JobKind, RunOutcome};

use crate::app::AppContext;
use crate::application::services::LifecyclePorts;
use crate::application::services::install::install_agent;
use crate::application::services::report::run_job;
use crate::infra::host::MacHost;
use crate::infra::vendor::FalconApi;
use crate::output::TerminalReporter;

/// Run the install job and report its outcome.
///
/// # Errors
///
/// Returns an error only if the outcome cannot be rendered.
pub async fn run(app: &AppContext) -> Result<RunOutcome> {
    let reporter = TerminalReporter::new(&app.output);
    let notifier = app.notifier();
    let host = MacHost::new(&app.runner);

    let outcome = run_job(JobKind::Install, &notifier, &host, async {
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
        install_agent(&ports, &app.config).await
    })
    .await;

    app.output.outcome(JobKind::Install, &outcome)?;
    Ok(outcome)
}
