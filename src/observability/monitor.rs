use std::sync::{Arc, Mutex};

use super::MetricsCollector;

pub struct SessionMonitor {
    collector: Arc<Mutex<MetricsCollector>>,
}

impl SessionMonitor {
    pub fn new(collector: Arc<Mutex<MetricsCollector>>) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self
            .collector
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .snapshot();

        if snapshot.is_empty() {
            return "No active sessions".to_string();
        }

        let mut ids: Vec<_> = snapshot.keys().copied().collect();
        ids.sort_unstable();

        let mut report = String::from("=== Session Metrics ===\n");
        for id in ids {
            let m = &snapshot[&id];
            report.push_str(&format!(
                "\n[session {}]\n  Frames: {} received, {} processed, {} dropped\n  Decode errors: {}\n  Spectral fallbacks: {}\n  Inconclusive windows: {}\n  Avg Latency: {}μs\n",
                id,
                m.frames_received,
                m.frames_processed,
                m.frames_dropped,
                m.decode_errors,
                m.spectral_fallbacks,
                m.inconclusive_windows,
                m.avg_latency_us
            ));
        }

        report
    }
}
