//! Command implementations

pub mod cleanup;
pub mod config_failure;
pub mod install;
pub mod uninstall;
pub mod version;
