//! Destinations for committed metric batches.

use std::sync::Mutex;

use tracing::info;

use super::MetricSample;
use crate::check::CheckId;

/// Receives each committed batch.
pub trait MetricSink: Send + Sync {
    fn flush(&self, check: &CheckId, batch: Vec<MetricSample>);
}

/// Writes every sample to the log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MetricSink for LogSink {
    fn flush(&self, check: &CheckId, batch: Vec<MetricSample>) {
        for sample in batch {
            info!(
                check = %check,
                metric = %sample.name,
                kind = %sample.kind,
                value = sample.value,
                host = sample.hostname.as_deref().unwrap_or(""),
                tags = ?sample.tags,
                "metric"
            );
        }
    }
}

/// Keeps committed batches in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<(CheckId, Vec<MetricSample>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all batches committed so far, oldest first.
    pub fn batches(&self) -> Vec<(CheckId, Vec<MetricSample>)> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Returns the most recent committed sample with the given name.
    pub fn last_value(&self, name: &str) -> Option<f64> {
        let batches = self.batches.lock().ok()?;
        batches
            .iter()
            .rev()
            .flat_map(|(_, batch)| batch.iter().rev())
            .find(|s| s.name == name)
            .map(|s| s.value)
    }

    /// Number of committed batches.
    pub fn commit_count(&self) -> usize {
        self.batches.lock().map(|b| b.len()).unwrap_or(0)
    }
}

impl MetricSink for MemorySink {
    fn flush(&self, check: &CheckId, batch: Vec<MetricSample>) {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push((check.clone(), batch));
        }
    }
}
