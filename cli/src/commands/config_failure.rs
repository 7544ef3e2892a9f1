//! Reporting for jobs whose configuration could not be loaded.

use anyhow::Result;
use fleetops_common::{JobKind, RunOutcome};

use crate::app::AppContext;
use crate::application::services::report::run_job;
use crate::infra::host::MacHost;

/// Turn a configuration load failure into an `Error` outcome for `job`.
///
/// `app` carries the fallback configuration, so the notification goes to
/// whatever webhook the environment names.
///
/// # Errors
///
/// Returns an error only if the outcome cannot be rendered.
pub async fn run(app: &AppContext, job: JobKind, err: &anyhow::Error) -> Result<RunOutcome> {
    let notifier = app.notifier();
    let host = MacHost::new(&app.runner);
    let detail = format!("configuration error: {err:#}");

    let outcome = run_job(job, &notifier, &host, async { RunOutcome::error(detail) }).await;

    app.output.outcome(job, &outcome)?;
    Ok(outcome)
}
