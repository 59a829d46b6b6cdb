//! Scoped ownership of a service-manager connection.

use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::traits::UnitConnection;

/// Owns an open connection and closes it exactly once when dropped.
///
/// The guard is created right after a successful `open`, so every exit path
/// of a collection cycle (early `?` return included) releases the connection.
pub struct ScopedConnection<C: UnitConnection> {
    conn: Option<C>,
}

impl<C: UnitConnection> ScopedConnection<C> {
    /// Takes ownership of an open connection.
    pub fn new(conn: C) -> Self {
        Self { conn: Some(conn) }
    }

    /// Closes the connection now instead of at the end of the scope.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            trace!("closing service manager connection");
            conn.close();
        }
    }
}

impl<C: UnitConnection> Deref for ScopedConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // Only `release` takes the connection, and it runs on close/drop.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<C: UnitConnection> DerefMut for ScopedConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<C: UnitConnection> Drop for ScopedConnection<C> {
    fn drop(&mut self) {
        self.release();
    }
}
