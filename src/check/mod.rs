//! Check framework: identity, the `Check` trait and the factory catalog.
//!
//! A check is configured once from its raw instance and `init_config`
//! documents, then run once per scheduling tick. The scheduler never runs
//! two cycles of the same instance concurrently, and `configure` takes
//! `&mut self` so it cannot overlap a `run`.

mod catalog;
pub mod config;
pub mod file;
mod id;
pub mod systemd;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

pub use catalog::{CheckCatalog, CheckFactory};
pub use config::{CheckConfig, ConfigError, InitConfig, InstanceConfig};
pub use file::{CheckConfigFile, ConfigFileError};
pub use id::CheckId;
pub use systemd::{CollectionError, SystemdCheck};

/// Error returned through the [`Check`] trait.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("unknown check: {0}")]
    UnknownCheck(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// A periodically scheduled metrics check.
pub trait Check: Send {
    /// Check type name, e.g. `systemd`.
    fn name(&self) -> &str;

    /// Identity of this configured instance.
    fn id(&self) -> &CheckId;

    /// How often the scheduler should run this instance.
    fn interval(&self) -> Duration;

    /// Replaces the configuration from raw documents.
    fn configure(&mut self, instance: &str, init_config: &str) -> Result<(), CheckError>;

    /// Runs one collection cycle.
    fn run(&self) -> Result<(), CheckError>;
}
