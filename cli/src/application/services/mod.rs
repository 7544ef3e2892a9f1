//! Application services — use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports` — never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod cleanup;
pub mod install;
pub mod report;
pub mod retry;
pub mod session;
pub mod uninstall;

use crate::application::ports::{CommandRunner, FileHasher, LocalFs, ProgressReporter, VendorApi};

/// The ports an agent lifecycle job talks to.
///
/// Borrowed for the duration of one run; commands build it from the
/// production adapters and tests from mocks.
pub struct LifecyclePorts<'a, A, C, F, H, P> {
    pub api: &'a A,
    pub runner: &'a C,
    pub fs: &'a F,
    pub hasher: &'a H,
    pub reporter: &'a P,
}

impl<A, C, F, H, P> LifecyclePorts<'_, A, C, F, H, P>
where
    A: VendorApi,
    C: CommandRunner,
    F: LocalFs,
    H: FileHasher,
    P: ProgressReporter,
{
    /// Emit a stage transition to both the log and the progress reporter.
    pub(crate) fn enter(&self, job: &'static str, stage: impl std::fmt::Display) {
        tracing::info!(job, %stage, "entering stage");
        self.reporter.step(&stage.to_string());
    }
}

/// One-line description of a failed process: exit code plus the last
/// non-empty line of stderr (or stdout when stderr is silent).
pub(crate) fn exit_summary(output: &std::process::Output) -> String {
    let code = output
        .status
        .code()
        .map_or_else(|| "killed by signal".to_string(), |c| format!("exit code {c}"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let last_line = |s: &str| {
        s.lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    };
    match last_line(&stderr).or_else(|| last_line(&stdout)) {
        Some(line) => format!("{code}: {line}"),
        None => code,
    }
}
