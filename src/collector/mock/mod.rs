//! Mock service manager implementations for testing.
//!
//! This module provides `MockServiceManager` and pre-built scenarios for
//! testing the systemd check without a running init system.

mod manager;
mod scenarios;

pub use manager::{MockConnection, MockServiceManager};
