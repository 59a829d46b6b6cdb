//! In-memory service manager for testing checks without systemd.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::collector::traits::{ConnectionError, ServiceManager, UnitConnection, UnitStatus};

/// Call counters shared between a manager and the connections it opened.
#[derive(Debug, Default)]
struct CallLog {
    open: AtomicUsize,
    list: AtomicUsize,
    close: AtomicUsize,
}

/// Scripted service manager.
///
/// Serves a fixed unit list and records how often connections are opened,
/// queried and closed. Clones share the same counters, so a test can keep a
/// handle while the check owns another.
#[derive(Debug, Clone, Default)]
pub struct MockServiceManager {
    units: Arc<Mutex<Vec<UnitStatus>>>,
    open_error: Option<ConnectionError>,
    list_error: Option<ConnectionError>,
    calls: Arc<CallLog>,
}

impl MockServiceManager {
    /// Creates a manager that knows no units.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager serving the given units.
    pub fn with_units(units: Vec<UnitStatus>) -> Self {
        Self {
            units: Arc::new(Mutex::new(units)),
            ..Self::default()
        }
    }

    /// Adds a unit to the listing.
    pub fn add_unit(&self, name: &str, active_state: &str, sub_state: &str) {
        if let Ok(mut units) = self.units.lock() {
            units.push(UnitStatus::new(name, active_state, sub_state));
        }
    }

    /// Makes every `open` call fail with an unavailable error.
    pub fn with_open_failure(mut self, msg: &str) -> Self {
        self.open_error = Some(ConnectionError::Unavailable(msg.to_string()));
        self
    }

    /// Makes every `list_units` call fail.
    pub fn with_list_failure(mut self, msg: &str) -> Self {
        self.list_error = Some(ConnectionError::CallFailed(msg.to_string()));
        self
    }

    /// Number of `open` calls, successful or not.
    pub fn open_calls(&self) -> usize {
        self.calls.open.load(Ordering::SeqCst)
    }

    /// Number of `list_units` calls.
    pub fn list_calls(&self) -> usize {
        self.calls.list.load(Ordering::SeqCst)
    }

    /// Number of connections released.
    pub fn close_calls(&self) -> usize {
        self.calls.close.load(Ordering::SeqCst)
    }
}

/// Connection handed out by [`MockServiceManager`].
#[derive(Debug)]
pub struct MockConnection {
    units: Vec<UnitStatus>,
    list_error: Option<ConnectionError>,
    calls: Arc<CallLog>,
}

impl UnitConnection for MockConnection {
    fn list_units(&mut self) -> Result<Vec<UnitStatus>, ConnectionError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        match &self.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.units.clone()),
        }
    }

    fn close(self) {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
    }
}

impl ServiceManager for MockServiceManager {
    type Connection = MockConnection;

    fn open(&self) -> Result<MockConnection, ConnectionError> {
        self.calls.open.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }

        let units = self
            .units
            .lock()
            .map(|units| units.clone())
            .unwrap_or_default();

        Ok(MockConnection {
            units,
            list_error: self.list_error.clone(),
            calls: Arc::clone(&self.calls),
        })
    }
}
