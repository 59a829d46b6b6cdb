//! Systemd unit check.
//!
//! Each run lists every unit known to the service manager and reports how
//! many of them are active:
//!
//! ```text
//! sender ──► open ──► ScopedConnection ──► list_units ──► count ──► gauge ──► commit
//!                            │                                                    │
//!                            └──────────── closed on every exit path ─────────────┘
//! ```
//!
//! `unit_names` and `unit_regex` are decoded and compiled but do not restrict
//! which units are counted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::config::{CheckConfig, ConfigError};
use super::{Check, CheckCatalog, CheckError, CheckId};
use crate::collector::{
    ConnectionError, ScopedConnection, ServiceManager, UnitConnection, UnitStatus,
};
use crate::sender::{SenderError, SenderProvider};

/// Name the check is registered under.
pub const CHECK_NAME: &str = "systemd";

/// Number of units whose active state is `active`.
pub const ACTIVE_COUNT_METRIC: &str = "systemd.unit.active.count";

/// Constant-valued gauge, not a measurement. Name and value are provisional.
pub const PLACEHOLDER_CPU_METRIC: &str = "systemd.unit.cpu";
const PLACEHOLDER_CPU_VALUE: f64 = 1.0;

/// Error type for a single collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("metrics sender unavailable: {0}")]
    SenderUnavailable(#[source] SenderError),
    #[error("cannot connect to service manager: {0}")]
    ConnectionFailed(#[source] ConnectionError),
    #[error("cannot list units: {0}")]
    ListFailed(#[source] ConnectionError),
}

/// Check reporting the number of active systemd units.
pub struct SystemdCheck<M: ServiceManager> {
    id: CheckId,
    config: CheckConfig,
    manager: M,
    senders: Arc<dyn SenderProvider>,
}

impl<M: ServiceManager> SystemdCheck<M> {
    /// Creates an unconfigured check.
    ///
    /// # Arguments
    /// * `manager` - Service manager provider (real or mock)
    /// * `senders` - Provider of the metrics sender for this check
    pub fn new(manager: M, senders: Arc<dyn SenderProvider>) -> Self {
        Self {
            id: CheckId::new(CHECK_NAME, "", ""),
            config: CheckConfig::default(),
            manager,
            senders,
        }
    }

    pub fn id(&self) -> &CheckId {
        &self.id
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Replaces the configuration with the decoded raw documents.
    ///
    /// On error the previous configuration and id are kept.
    pub fn configure(
        &mut self,
        raw_instance: &str,
        raw_init_config: &str,
    ) -> Result<(), ConfigError> {
        let config = CheckConfig::parse(raw_instance, raw_init_config)?;

        if config.instance.has_filter() {
            warn!(
                unit_names = config.instance.unit_names.len(),
                unit_regex = config.instance.unit_regex_patterns.len(),
                "unit filter is configured but not applied to {}",
                ACTIVE_COUNT_METRIC
            );
        }

        self.id = CheckId::new(CHECK_NAME, raw_instance, raw_init_config);
        self.config = config;
        debug!(check = %self.id, "systemd check configured");
        Ok(())
    }

    /// Runs one collection cycle.
    ///
    /// Once the connection is open it is closed exactly once, whichever step
    /// fails afterwards.
    pub fn run(&self) -> Result<(), CollectionError> {
        let sender = self
            .senders
            .sender(&self.id)
            .map_err(CollectionError::SenderUnavailable)?;

        let conn = self.manager.open().map_err(|e| {
            error!(check = %self.id, error = %e, "new connection failed");
            CollectionError::ConnectionFailed(e)
        })?;
        let mut conn = ScopedConnection::new(conn);

        let units = conn.list_units().map_err(|e| {
            error!(check = %self.id, error = %e, "list units failed");
            CollectionError::ListFailed(e)
        })?;
        conn.close();

        let active = self.count_active(&units);

        let tags = &self.config.common.tags;
        sender.gauge(ACTIVE_COUNT_METRIC, active as f64, "", tags);
        sender.gauge(PLACEHOLDER_CPU_METRIC, PLACEHOLDER_CPU_VALUE, "", tags);
        sender.commit();

        debug!(check = %self.id, units = units.len(), active, "systemd check run");
        Ok(())
    }

    fn count_active(&self, units: &[UnitStatus]) -> usize {
        let filter = &self.config.instance;
        let mut active = 0;
        for unit in units {
            debug!(
                unit = %unit.name,
                active_state = %unit.active_state,
                sub_state = %unit.sub_state,
                selected = filter.has_filter() && filter.selects(&unit.name),
                "unit"
            );
            if unit.is_active() {
                active += 1;
            }
        }
        active
    }
}

impl<M: ServiceManager + 'static> Check for SystemdCheck<M> {
    fn name(&self) -> &str {
        CHECK_NAME
    }

    fn id(&self) -> &CheckId {
        &self.id
    }

    fn interval(&self) -> Duration {
        self.config.common.min_collection_interval
    }

    fn configure(&mut self, instance: &str, init_config: &str) -> Result<(), CheckError> {
        SystemdCheck::configure(self, instance, init_config).map_err(CheckError::from)
    }

    fn run(&self) -> Result<(), CheckError> {
        SystemdCheck::run(self).map_err(CheckError::from)
    }
}

/// Registers the systemd check factory under [`CHECK_NAME`].
pub fn register<M>(catalog: &mut CheckCatalog, manager: M, senders: Arc<dyn SenderProvider>)
where
    M: ServiceManager + Clone + 'static,
{
    catalog.register(CHECK_NAME, move || -> Box<dyn Check> {
        Box::new(SystemdCheck::new(manager.clone(), Arc::clone(&senders)))
    });
}
