//! Output formatting module

pub mod json;
pub mod reporter;
pub mod styles;

use console::Term;
use fleetops_common::{JobKind, RunOutcome, RunStatus};
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether the final result is printed as JSON.
    pub json: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    ///
    /// `--json` implies `quiet` so progress lines never interleave with the
    /// JSON document on stdout.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool, json: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && !json && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet: quiet || json,
            json,
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print an error message prefixed with `✗` to stderr. Never suppressed.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }

    /// Print the final outcome of a job.
    ///
    /// Services already print success and warning lines through the
    /// reporter, so human mode only adds the error line here.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn outcome(&self, job: JobKind, outcome: &RunOutcome) -> anyhow::Result<()> {
        if self.json {
            println!("{}", json::format_outcome(job, outcome)?);
        } else if outcome.status == RunStatus::Error {
            self.error(&format!("{job} failed: {}", outcome.detail));
        }
        Ok(())
    }
}
