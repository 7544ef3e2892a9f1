//! Host identity — implements `HostInspector` on macOS.
//!
//! Every probe is best-effort; a field that cannot be read is reported as
//! `unknown` so notifications still go out.

use std::sync::LazyLock;

use fleetops_common::MachineIdentity;
use regex::Regex;

use crate::application::ports::{CommandRunner, HostInspector};

#[allow(clippy::expect_used)]
static SERIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""IOPlatformSerialNumber"\s*=\s*"([^"]+)""#).expect("valid regex")
});

/// Pull the serial number out of `ioreg -rd1 -c IOPlatformExpertDevice`.
#[must_use]
pub fn parse_serial_number(ioreg_output: &str) -> Option<String> {
    SERIAL_RE
        .captures(ioreg_output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reads identity via `scutil`, `ioreg` and `sw_vers`.
pub struct MacHost<'a, C: CommandRunner> {
    runner: &'a C,
}

impl<'a, C: CommandRunner> MacHost<'a, C> {
    pub fn new(runner: &'a C) -> Self {
        Self { runner }
    }

    async fn stdout_of(&self, program: &str, args: &[&str]) -> Option<String> {
        match self.runner.run(program, args).await {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!text.is_empty()).then_some(text)
            }
            Ok(out) => {
                tracing::debug!(program, code = ?out.status.code(), "host probe failed");
                None
            }
            Err(e) => {
                tracing::debug!(program, error = %format!("{e:#}"), "host probe failed");
                None
            }
        }
    }

    async fn hostname(&self) -> Option<String> {
        if let Some(name) = self
            .stdout_of("/usr/sbin/scutil", &["--get", "ComputerName"])
            .await
        {
            return Some(name);
        }
        hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().to_string())
            .filter(|h| !h.is_empty())
    }
}

impl<C: CommandRunner> HostInspector for MacHost<'_, C> {
    async fn identity(&self) -> MachineIdentity {
        let unknown = || MachineIdentity::UNKNOWN.to_string();
        let hostname = self.hostname().await.unwrap_or_else(unknown);
        let serial_number = self
            .stdout_of("/usr/sbin/ioreg", &["-rd1", "-c", "IOPlatformExpertDevice"])
            .await
            .as_deref()
            .and_then(parse_serial_number)
            .unwrap_or_else(unknown);
        let os_version = self
            .stdout_of("/usr/bin/sw_vers", &["-productVersion"])
            .await
            .unwrap_or_else(unknown);
        MachineIdentity {
            hostname,
            serial_number,
            os_version,
        }
    }
}
