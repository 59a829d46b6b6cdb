//! Service-manager access for unit collection.
//!
//! This module provides the infrastructure for listing systemd units, with
//! support for mocking so checks can be tested without a running init system.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 SystemdCheck                 │
//! │   open() ──► ScopedConnection ──► list_units │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                ┌───────▼────────┐
//!                │ ServiceManager │ (trait)
//!                └───────┬────────┘
//!                        │
//!           ┌────────────┴────────────┐
//!           │                         │
//!    ┌──────▼──────┐          ┌───────▼───────────┐
//!    │  Systemctl  │          │ MockServiceManager│
//!    │ (systemd)   │          │ (Testing)         │
//!    └─────────────┘          └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use unitwatch::collector::{MockServiceManager, ScopedConnection, ServiceManager, UnitConnection};
//!
//! let manager = MockServiceManager::typical_host();
//! let mut conn = ScopedConnection::new(manager.open().unwrap());
//! let units = conn.list_units().unwrap();
//! assert_eq!(units.iter().filter(|u| u.is_active()).count(), 3);
//! ```

mod guard;
pub mod mock;
pub mod systemctl;
pub mod traits;

pub use guard::ScopedConnection;
pub use mock::{MockConnection, MockServiceManager};
pub use systemctl::{ManagerScope, Systemctl, SystemctlConnection};
pub use traits::{ConnectionError, ServiceManager, UnitConnection, UnitStatus};
