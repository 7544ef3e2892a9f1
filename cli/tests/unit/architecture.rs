//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the Clean Architecture
//! boundaries between domain, application, infra and presentation hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn rel(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

fn src_dir(parts: &[&str]) -> PathBuf {
    parts
        .iter()
        .fold(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"), |p, part| p.join(part))
}

/// Report every non-test line under `dir` containing one of `forbidden`.
fn forbidden_lines(dir: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let mut tracker = CfgTestTracker::new();
        for (i, line) in content.lines().enumerate() {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            if in_test || trimmed.starts_with("//") {
                continue;
            }
            for pattern in forbidden {
                if line.contains(pattern) {
                    violations.push(format!("{}:{}: `{pattern}`: {line}", rel(&file), i + 1));
                }
            }
        }
    }
    violations
}

// ── Domain is pure ────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let violations = forbidden_lines(
        &src_dir(&["domain"]),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
            "reqwest",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay free of I/O and outer layers:\n{}",
        violations.join("\n")
    );
}

// ── Services depend on ports only ─────────────────────────────────────────────

#[test]
fn services_do_not_import_infra_or_presentation() {
    let violations = forbidden_lines(
        &src_dir(&["application"]),
        &[
            "crate::infra",
            "crate::commands",
            "crate::output",
            "reqwest",
            "println!",
            "eprintln!",
        ],
    );
    assert!(
        violations.is_empty(),
        "application/ must reach I/O only through port traits:\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_take_trait_bounds_not_concrete_adapters() {
    let concrete = ["FalconApi", "TokioCommandRunner", "OsFs", "WebhookNotifier", "MacHost"];
    let violations = forbidden_lines(&src_dir(&["application", "services"]), &concrete);
    assert!(
        violations.is_empty(),
        "Found concrete adapter types in services — use trait bounds instead:\n{}",
        violations.join("\n")
    );
}

// ── Infra stays below presentation ────────────────────────────────────────────

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = forbidden_lines(&src_dir(&["infra"]), &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = forbidden_lines(&src_dir(&["infra"]), &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

// ── Secrets stay off argv ─────────────────────────────────────────────────────

#[test]
fn maintenance_token_is_never_formatted_into_args() {
    let file = src_dir(&["application", "services", "uninstall.rs"]);
    let content = std::fs::read_to_string(&file).expect("read uninstall.rs");
    let arg_lines: Vec<&str> = content
        .lines()
        .filter(|l| l.contains("&[") && l.contains("maintenance_token"))
        .collect();
    assert!(
        arg_lines.is_empty(),
        "maintenance token must go through stdin, not argv:\n{}",
        arg_lines.join("\n")
    );
}
