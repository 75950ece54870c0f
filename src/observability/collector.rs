use std::collections::HashMap;
use std::sync::Arc;

use super::SessionMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub session_id: u64,
    pub frames_received: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub decode_errors: u64,
    pub spectral_fallbacks: u64,
    pub inconclusive_windows: u64,
    pub avg_latency_us: u64,
}

impl MetricsSnapshot {
    pub fn of(metrics: &SessionMetrics) -> Self {
        Self {
            session_id: metrics.session_id(),
            frames_received: metrics.frames_received(),
            frames_processed: metrics.frames_processed(),
            frames_dropped: metrics.frames_dropped(),
            decode_errors: metrics.decode_errors(),
            spectral_fallbacks: metrics.spectral_fallbacks(),
            inconclusive_windows: metrics.inconclusive_windows(),
            avg_latency_us: metrics.avg_latency_us(),
        }
    }
}

/// Metrics of the live sessions, keyed by session id
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: HashMap<u64, Arc<SessionMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: HashMap::new(),
        }
    }

    pub fn register(&mut self, metrics: Arc<SessionMetrics>) {
        self.metrics.insert(metrics.session_id(), metrics);
    }

    pub fn unregister(&mut self, session_id: u64) -> Option<Arc<SessionMetrics>> {
        self.metrics.remove(&session_id)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn snapshot(&self) -> HashMap<u64, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metrics)| (*id, MetricsSnapshot::of(metrics)))
            .collect()
    }

    pub fn get_session_metrics(&self, session_id: u64) -> Option<Arc<SessionMetrics>> {
        self.metrics.get(&session_id).cloned()
    }
}
