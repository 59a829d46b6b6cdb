//! In-process sender provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, warn};

use super::{MetricKind, MetricSample, MetricSink, Sender, SenderError, SenderProvider};
use crate::check::CheckId;

/// Buffers samples for one check until commit.
pub struct CheckSender {
    id: CheckId,
    pending: Mutex<Vec<MetricSample>>,
    sink: Arc<dyn MetricSink>,
}

impl CheckSender {
    fn new(id: CheckId, sink: Arc<dyn MetricSink>) -> Self {
        Self {
            id,
            pending: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Number of samples waiting for the next commit.
    pub fn pending(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn submit(&self, sample: MetricSample) {
        match self.pending.lock() {
            Ok(mut pending) => pending.push(sample),
            Err(_) => warn!(
                check = %self.id,
                metric = %sample.name,
                "sample buffer poisoned, dropping sample"
            ),
        }
    }
}

impl Sender for CheckSender {
    fn gauge(&self, name: &str, value: f64, hostname: &str, tags: &[String]) {
        self.submit(MetricSample {
            name: name.to_string(),
            kind: MetricKind::Gauge,
            value,
            hostname: (!hostname.is_empty()).then(|| hostname.to_string()),
            tags: tags.to_vec(),
            timestamp: Utc::now(),
        });
    }

    fn commit(&self) {
        let batch = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        debug!(check = %self.id, samples = batch.len(), "committing metrics");
        self.sink.flush(&self.id, batch);
    }
}

/// Registry of per-check senders.
///
/// Senders are created on first request and reused for the same `CheckId`.
pub struct Aggregator {
    sink: Arc<dyn MetricSink>,
    senders: Mutex<HashMap<CheckId, Arc<CheckSender>>>,
    closed: AtomicBool,
}

impl Aggregator {
    /// Creates an aggregator forwarding committed batches to `sink`.
    pub fn new(sink: Arc<dyn MetricSink>) -> Self {
        Self {
            sink,
            senders: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the concrete sender for `id`, creating it if needed.
    pub fn check_sender(&self, id: &CheckId) -> Result<Arc<CheckSender>, SenderError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SenderError::Closed);
        }

        let mut senders = self
            .senders
            .lock()
            .map_err(|_| SenderError::Unavailable(id.to_string()))?;

        let sender = senders.entry(id.clone()).or_insert_with(|| {
            debug!(check = %id, "creating sender");
            Arc::new(CheckSender::new(id.clone(), Arc::clone(&self.sink)))
        });
        Ok(Arc::clone(sender))
    }

    /// Forgets the sender of a removed check.
    pub fn close_sender(&self, id: &CheckId) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.remove(id);
        }
    }

    /// Stops handing out senders. Existing handles keep working.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(mut senders) = self.senders.lock() {
            senders.clear();
        }
    }

    /// Number of live senders.
    pub fn sender_count(&self) -> usize {
        self.senders.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl SenderProvider for Aggregator {
    fn sender(&self, id: &CheckId) -> Result<Arc<dyn Sender>, SenderError> {
        let sender: Arc<dyn Sender> = self.check_sender(id)?;
        Ok(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::MemorySink;

    fn setup() -> (Arc<MemorySink>, Aggregator) {
        let sink = Arc::new(MemorySink::new());
        let aggregator = Aggregator::new(sink.clone());
        (sink, aggregator)
    }

    #[test]
    fn test_same_id_same_sender() {
        let (_, aggregator) = setup();
        let id = CheckId::new("systemd", "", "");
        let a = aggregator.check_sender(&id).unwrap();
        let b = aggregator.check_sender(&id).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(aggregator.sender_count(), 1);
    }

    #[test]
    fn test_commit_flushes_batch() {
        let (sink, aggregator) = setup();
        let id = CheckId::new("systemd", "unit_names: [a]", "");
        let sender = aggregator.sender(&id).unwrap();

        sender.gauge("systemd.unit.active.count", 4.0, "", &[]);
        sender.gauge("other", 1.0, "box-1", &["env:prod".to_string()]);
        assert_eq!(sink.commit_count(), 0);

        sender.commit();
        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, id);
        assert_eq!(batches[0].1.len(), 2);
        assert_eq!(batches[0].1[0].hostname, None);
        assert_eq!(batches[0].1[1].hostname.as_deref(), Some("box-1"));
        assert_eq!(batches[0].1[1].tags, vec!["env:prod".to_string()]);
        assert_eq!(sink.last_value("systemd.unit.active.count"), Some(4.0));
    }

    #[test]
    fn test_commit_drains_pending() {
        let (sink, aggregator) = setup();
        let id = CheckId::new("systemd", "", "");
        let sender = aggregator.check_sender(&id).unwrap();

        sender.gauge("m", 1.0, "", &[]);
        assert_eq!(sender.pending(), 1);
        sender.commit();
        assert_eq!(sender.pending(), 0);

        sender.commit();
        let batches = sink.batches();
        assert_eq!(batches.len(), 2);
        assert!(batches[1].1.is_empty());
    }

    #[test]
    fn test_closed_aggregator_refuses_senders() {
        let (_, aggregator) = setup();
        let id = CheckId::new("systemd", "", "");
        aggregator.check_sender(&id).unwrap();

        aggregator.close();
        assert_eq!(aggregator.sender_count(), 0);
        assert_eq!(aggregator.sender(&id).err(), Some(SenderError::Closed));
    }

    #[test]
    fn test_close_sender() {
        let (_, aggregator) = setup();
        let id = CheckId::new("systemd", "", "");
        aggregator.check_sender(&id).unwrap();
        aggregator.close_sender(&id);
        assert_eq!(aggregator.sender_count(), 0);
    }
}
