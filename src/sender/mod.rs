//! Metric submission for checks.
//!
//! A check obtains a [`Sender`] for its [`CheckId`] from a
//! [`SenderProvider`], submits samples, then commits them as one batch.
//! The in-process [`Aggregator`] buffers samples per check and forwards
//! committed batches to a [`MetricSink`].

mod aggregator;
mod sink;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::check::CheckId;

pub use aggregator::{Aggregator, CheckSender};
pub use sink::{LogSink, MemorySink, MetricSink};

/// Error type for sender acquisition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SenderError {
    /// The aggregator no longer hands out senders.
    #[error("aggregator is closed")]
    Closed,
    /// The provider refused a sender for this check.
    #[error("no sender available for check {0}")]
    Unavailable(String),
}

/// Kind of metric sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Point-in-time value, overwritten each interval.
    Gauge,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Gauge => write!(f, "gauge"),
        }
    }
}

/// A single submitted sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub kind: MetricKind,
    pub value: f64,
    /// Host override; `None` means the agent's own hostname.
    pub hostname: Option<String>,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Per-check metric submission handle.
pub trait Sender: Send + Sync {
    /// Submits a gauge sample. An empty `hostname` keeps the default host.
    fn gauge(&self, name: &str, value: f64, hostname: &str, tags: &[String]);

    /// Flushes every sample submitted since the previous commit.
    fn commit(&self);
}

/// Hands out senders keyed by check identity.
pub trait SenderProvider: Send + Sync {
    fn sender(&self, id: &CheckId) -> Result<Arc<dyn Sender>, SenderError>;
}
