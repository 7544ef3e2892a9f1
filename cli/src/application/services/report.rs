//! Application service — deliver each job's outcome to the notifier.

use std::future::Future;

use chrono::Utc;
use fleetops_common::{JobKind, Notification, RunOutcome};

use crate::application::ports::{HostInspector, Notifier};

/// Await a job and report its outcome exactly once.
///
/// The job future must already have run its own teardown (token
/// revocation, artifact removal) and resolved to an outcome; this wrapper
/// only adds the notification. Notifier failures are logged and swallowed.
pub async fn run_job<N, H, Fut>(job: JobKind, notifier: &N, host: &H, work: Fut) -> RunOutcome
where
    N: Notifier,
    H: HostInspector,
    Fut: Future<Output = RunOutcome>,
{
    let outcome = work.await;
    tracing::info!(%job, status = %outcome.status, detail = %outcome.detail, "job finished");

    let identity = host.identity().await;
    let notification = Notification::new(job, &outcome, identity, Utc::now());
    if let Err(e) = notifier.notify(&notification).await {
        tracing::warn!(%job, error = %format!("{e:#}"), "failed to deliver notification");
    }
    outcome
}
