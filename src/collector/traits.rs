//! Abstractions over the service manager to enable testing and mocking.
//!
//! The `ServiceManager` trait allows the systemd check to talk to the real
//! init system through `systemctl` or to a scripted mock in tests.

use std::fmt;

/// Active state reported for units that are running.
pub const ACTIVE_STATE: &str = "active";

/// Error type for service-manager access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The service manager could not be reached.
    #[error("service manager unavailable: {0}")]
    Unavailable(String),
    /// The remote call was issued but failed.
    #[error("service manager call failed: {0}")]
    CallFailed(String),
    /// The reply could not be interpreted.
    #[error("malformed unit listing: {0}")]
    Malformed(String),
}

/// Status of a single unit as reported by the service manager.
///
/// Fetched fresh on every collection cycle and never mutated by the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitStatus {
    /// Primary unit name, e.g. `sshd.service`.
    pub name: String,
    /// Whether the unit definition was loaded (`loaded`, `not-found`, ...).
    pub load_state: String,
    /// High-level activation state (`active`, `inactive`, `failed`, ...).
    pub active_state: String,
    /// Unit-type specific state (`running`, `exited`, `listening`, ...).
    pub sub_state: String,
    /// Human readable description.
    pub description: String,
}

impl UnitStatus {
    /// Creates a unit status with the given name and states.
    pub fn new(
        name: impl Into<String>,
        active_state: impl Into<String>,
        sub_state: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            load_state: "loaded".to_string(),
            active_state: active_state.into(),
            sub_state: sub_state.into(),
            description: String::new(),
        }
    }

    /// Returns `true` if the unit is in the `active` state.
    pub fn is_active(&self) -> bool {
        self.active_state == ACTIVE_STATE
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: ActiveState={}, SubState={}",
            self.name, self.active_state, self.sub_state
        )
    }
}

/// An open connection to the service manager.
///
/// A connection is private to a single collection cycle. `close` consumes
/// the connection so it can be released at most once.
pub trait UnitConnection {
    /// Lists all units currently known to the service manager.
    fn list_units(&mut self) -> Result<Vec<UnitStatus>, ConnectionError>;

    /// Releases the connection.
    fn close(self);
}

/// Provider of service-manager connections.
///
/// Implemented by [`Systemctl`](super::Systemctl) for production and by
/// [`MockServiceManager`](super::MockServiceManager) for tests.
pub trait ServiceManager: Send + Sync {
    /// Connection type handed out by this provider.
    type Connection: UnitConnection;

    /// Opens a new connection.
    fn open(&self) -> Result<Self::Connection, ConnectionError>;
}
