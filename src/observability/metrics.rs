use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::estimator::{FrameReport, RatePath};

pub struct SessionMetrics {
    session_id: u64,
    frames_received: AtomicU64,
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
    decode_errors: AtomicU64,
    spectral_fallbacks: AtomicU64,
    inconclusive_windows: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl SessionMetrics {
    pub fn new(session_id: u64) -> Self {
        Self {
            session_id,
            frames_received: AtomicU64::new(0),
            frames_processed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            spectral_fallbacks: AtomicU64::new(0),
            inconclusive_windows: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn spectral_fallbacks(&self) -> u64 {
        self.spectral_fallbacks.load(Ordering::Relaxed)
    }

    pub fn inconclusive_windows(&self) -> u64 {
        self.inconclusive_windows.load(Ordering::Relaxed)
    }

    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a frame that reached the window, by the path that decided it
    pub fn record_report(&self, report: &FrameReport) {
        match report.path {
            RatePath::Rejected => {
                self.record_decode_error();
                return;
            }
            RatePath::Spectral => {
                self.spectral_fallbacks.fetch_add(1, Ordering::Relaxed);
            }
            RatePath::Inconclusive => {
                self.inconclusive_windows.fetch_add(1, Ordering::Relaxed);
            }
            RatePath::Filling | RatePath::Peaks => {}
        }
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_processing(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_processing(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }
}
