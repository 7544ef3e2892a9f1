//! Unit tests for the install workflow.
//!
//! Network and process ports are mocked; the marker and download directory
//! live on a real temp filesystem so artifact cleanup is observable.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use fleetops_cli::application::services::LifecyclePorts;
use fleetops_cli::application::services::install::install_agent;
use fleetops_cli::infra::fs::OsFs;
use fleetops_common::{RunOutcome, RunStatus};

use crate::mocks::{
    DownloadBehavior, FixedHasher, MockApi, MockRunner, RecordingReporter, create_marker,
    download_dir_entries, test_config,
};

async fn run(
    api: &MockApi,
    runner: &MockRunner,
    hasher: &FixedHasher,
    cfg: &fleetops_cli::domain::FleetConfig,
) -> RunOutcome {
    let reporter = RecordingReporter::default();
    let ports = LifecyclePorts {
        api,
        runner,
        fs: &OsFs,
        hasher,
        reporter: &reporter,
    };
    install_agent(&ports, cfg).await
}

#[tokio::test]
async fn test_marker_present_short_circuits_without_network() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    create_marker(&cfg);
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success);
    assert!(api.calls().is_empty(), "no network calls: {:?}", api.calls());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_marker_present_with_missing_credentials_is_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = test_config(dir.path());
    cfg.vendor.client_secret = String::new();
    cfg.vendor.base_url = "not-a-url".to_string();
    create_marker(&cfg);
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success, "{}", outcome.detail);
    assert!(outcome.detail.contains("already installed"));
    assert!(api.calls().is_empty());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_happy_path_installs_and_confirms() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success, "{}", outcome.detail);
    assert!(outcome.detail.contains("FalconSensor.pkg"));
    assert!(cfg.install.marker_path.exists());

    let install = runner
        .calls()
        .into_iter()
        .find(|c| c.program == "/usr/sbin/installer")
        .expect("installer invoked");
    assert_eq!(install.args[0], "-pkg");
    assert!(install.args[1].ends_with("FalconSensor.pkg"));
    assert_eq!(&install.args[2..], ["-target", "/"]);

    assert!(download_dir_entries(&cfg).is_empty(), "artifact removed after install");
}

#[tokio::test]
async fn test_call_order_and_single_revoke_on_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(
        api.calls(),
        [
            "token",
            "catalog:platform:\"mac\"",
            "download:abc123",
            "revoke:session-token",
        ]
    );
}

#[tokio::test]
async fn test_digest_mismatch_deletes_artifact_and_skips_installer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("def456"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("abc123"), "{}", outcome.detail);
    assert!(outcome.detail.contains("def456"), "{}", outcome.detail);
    assert!(!runner.ran("/usr/sbin/installer"));
    assert!(download_dir_entries(&cfg).is_empty(), "artifact must not survive");
    assert_eq!(api.count("revoke"), 1);
}

#[tokio::test]
async fn test_auth_exhaustion_never_downloads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::failing_auth(3);
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("authentication failed after 3 attempts"));
    assert_eq!(api.count("token"), 3);
    assert_eq!(api.count("download"), 0);
    assert_eq!(api.count("revoke"), 0, "no token was ever held");
}

#[tokio::test]
async fn test_auth_recovers_within_budget() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::failing_auth(2);
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success, "{}", outcome.detail);
    assert_eq!(api.count("token"), 3);
}

#[tokio::test]
async fn test_catalog_failure_revokes_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    *api.catalog.lock().unwrap() = Err("installer catalog returned no installers".to_string());
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("installer lookup failed after 3 attempts"));
    assert_eq!(api.count("catalog"), 3);
    assert_eq!(api.count("revoke"), 1);
}

#[tokio::test]
async fn test_truncated_download_is_retried() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new().with_downloads(&[DownloadBehavior::Truncated, DownloadBehavior::Full]);
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success, "{}", outcome.detail);
    assert_eq!(api.count("download"), 2);
}

#[tokio::test]
async fn test_download_exhaustion_cleans_up_and_revokes_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let plan = [
        DownloadBehavior::Status(503),
        DownloadBehavior::Fail,
        DownloadBehavior::Truncated,
        DownloadBehavior::Status(404),
        DownloadBehavior::Truncated,
        DownloadBehavior::Fail,
        DownloadBehavior::Status(500),
        DownloadBehavior::Truncated,
        DownloadBehavior::Fail,
        DownloadBehavior::Truncated,
    ];
    let api = MockApi::new().with_downloads(&plan);
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("download failed after 10 attempts"));
    assert_eq!(api.count("download"), 10);
    assert_eq!(api.count("revoke"), 1);
    assert!(download_dir_entries(&cfg).is_empty(), "partial artifact removed");
    assert!(!runner.ran("/usr/sbin/installer"));
}

#[tokio::test]
async fn test_installer_failure_reports_exit_and_removes_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    let mut runner = MockRunner::new(&cfg);
    runner.installer_exit_ok = false;

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("installer failed: exit code 1"), "{}", outcome.detail);
    assert!(download_dir_entries(&cfg).is_empty());
    assert_eq!(api.count("revoke"), 1);
}

#[tokio::test]
async fn test_missing_marker_after_install_is_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    let mut runner = MockRunner::new(&cfg);
    runner.installer_creates_marker = false;

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("verification failed"), "{}", outcome.detail);
    assert_eq!(api.count("revoke"), 1);
    assert!(download_dir_entries(&cfg).is_empty(), "artifact removed");
}

#[tokio::test]
async fn test_revoke_failure_does_not_change_outcome() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let mut api = MockApi::new();
    api.revoke_fails = true;
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success, "{}", outcome.detail);
    assert_eq!(api.count("revoke"), 1);
}

#[tokio::test]
async fn test_customer_id_licenses_sensor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = test_config(dir.path());
    cfg.vendor.customer_id = Some("0123456789ABCDEF0123456789ABCDEF-12".to_string());
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Success, "{}", outcome.detail);
    let license = runner
        .calls()
        .into_iter()
        .find(|c| c.args.first().map(String::as_str) == Some("license"))
        .expect("falconctl license invoked");
    assert_eq!(license.args[1], "0123456789ABCDEF0123456789ABCDEF-12");
}

#[tokio::test]
async fn test_missing_credentials_fail_before_network() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = test_config(dir.path());
    cfg.vendor.client_secret = String::new();
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let outcome = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(outcome.status, RunStatus::Error);
    assert!(outcome.detail.contains("vendor.client_secret"), "{}", outcome.detail);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_second_run_after_success_only_checks_marker() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = test_config(dir.path());
    let api = MockApi::new();
    let runner = MockRunner::new(&cfg);

    let first = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;
    assert_eq!(first.status, RunStatus::Success);
    let calls_after_first = api.calls().len();
    let runs_after_first = runner.calls().len();

    let second = run(&api, &runner, &FixedHasher("abc123"), &cfg).await;

    assert_eq!(second.status, RunStatus::Success);
    assert_eq!(api.calls().len(), calls_after_first);
    assert_eq!(runner.calls().len(), runs_after_first);
}
