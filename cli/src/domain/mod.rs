//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod agent;
pub mod artifact;
pub mod config;
pub mod error;
pub mod retention;

pub use artifact::{ArtifactDescriptor, digests_match, hex_encode, sanitize_filename};
pub use config::{Credentials, EnvOverrides, FleetConfig, RetryConfig, RetryPolicy};
pub use error::{ConfigError, WorkflowError};
pub use retention::{RetentionPolicy, RetentionSummary};
