//! Integration tests for fleetops CLI
//!
//! These tests spawn the actual binary or drive the HTTP adapters against a
//! local mock server. They are slower and should be run separately from unit
//! tests.

mod vendor_api;
