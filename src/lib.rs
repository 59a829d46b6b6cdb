//! unitwatch - systemd unit metrics check.
//!
//! This library provides:
//! - `collector` - service-manager access (`systemctl`, mock) and unit status
//! - `check` - check framework, configuration and the `systemd` check
//! - `sender` - per-check metric senders and the in-process aggregator
//!
//! The `unitwatchd` daemon schedules configured checks and logs their metrics.

pub mod check;
pub mod collector;
pub mod sender;
