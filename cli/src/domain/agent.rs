//! Parsers for the endpoint agent's local tooling output.
//!
//! Pure functions only — callers run `falconctl` / `systemextensionsctl`
//! through the command runner and hand the captured stdout in here.

use std::sync::LazyLock;

use regex::Regex;

static AGENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?mi)^\s*agent\s?id:\s*([0-9a-f-]+)\s*$").expect("valid regex")
});

/// Extract the device (agent) ID from `falconctl stats agent_info` output.
///
/// The API expects the ID lower-case without dashes, so the value is
/// normalised and must come out as exactly 32 hex digits.
#[must_use]
pub fn parse_agent_id(stats: &str) -> Option<String> {
    let raw = AGENT_ID_RE.captures(stats)?.get(1)?.as_str();
    let id: String = raw
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit())).then_some(id)
}

/// Whether `systemextensionsctl list` output still mentions `bundle_id`.
///
/// Any listing counts, including `[terminated waiting to uninstall on
/// reboot]`: the extension stays loaded until the next restart.
#[must_use]
pub fn system_extension_listed(list_output: &str, bundle_id: &str) -> bool {
    list_output.lines().any(|line| line.contains(bundle_id))
}
