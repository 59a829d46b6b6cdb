//! Pre-built unit listings for testing.
//!
//! These scenarios provide realistic service-manager states for testing
//! the systemd check under various host conditions.

use super::manager::MockServiceManager;
use crate::collector::traits::UnitStatus;

impl MockServiceManager {
    /// A small host: three active units, one inactive, one failed.
    pub fn typical_host() -> Self {
        Self::with_units(vec![
            UnitStatus::new("sshd.service", "active", "running"),
            UnitStatus::new("systemd-journald.socket", "active", "listening"),
            UnitStatus::new("-.mount", "active", "mounted"),
            UnitStatus::new("cups.service", "inactive", "dead"),
            UnitStatus::new("nginx.service", "failed", "failed"),
        ])
    }

    /// Every unit is in a transitional state, none counts as active.
    pub fn transitioning_host() -> Self {
        Self::with_units(vec![
            UnitStatus::new("postgresql.service", "activating", "start-pre"),
            UnitStatus::new("docker.service", "deactivating", "stop-sigterm"),
            UnitStatus::new("apt-daily.timer", "reloading", "waiting"),
        ])
    }

    /// A large host with `count` units, every other one active.
    pub fn busy_host(count: usize) -> Self {
        let units = (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    UnitStatus::new(format!("worker@{i}.service"), "active", "running")
                } else {
                    UnitStatus::new(format!("worker@{i}.service"), "inactive", "dead")
                }
            })
            .collect();
        Self::with_units(units)
    }
}
