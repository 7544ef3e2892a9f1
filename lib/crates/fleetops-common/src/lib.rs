//! Types shared by every fleetops job: run outcomes and the webhook payload.

pub mod types;

pub use types::*;
