use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use crate::config::{EstimatorConfig, PulseConfig, SessionConfig};
use crate::core::{Estimate, RoiReducer};
use crate::estimator::RateEstimator;
use crate::observability::{MetricsCollector, SessionMetrics, SessionMonitor};

/// Shared compute pool. Hands out independent sessions whose analysis runs on
/// the blocking thread pool, at most `max_concurrent` frames at a time.
pub struct EstimatorPool {
    config: EstimatorConfig,
    session: SessionConfig,
    workers: Arc<Semaphore>,
    max_concurrent: usize,
    collector: Arc<Mutex<MetricsCollector>>,
    next_session_id: AtomicU64,
}

impl EstimatorPool {
    pub fn new(config: EstimatorConfig, max_concurrent: usize) -> Result<Self> {
        Self::with_session_config(
            config,
            SessionConfig {
                workers: max_concurrent,
                ..SessionConfig::default()
            },
        )
    }

    pub fn from_config(config: &PulseConfig) -> Result<Self> {
        Self::with_session_config(config.estimator.clone(), config.session.clone())
    }

    fn with_session_config(config: EstimatorConfig, session: SessionConfig) -> Result<Self> {
        // Validate config by creating one estimator
        RateEstimator::new(config.clone()).context("invalid estimator config")?;
        session.validate()?;

        let max_concurrent = session.worker_count();
        info!("Estimator pool ready with {} workers", max_concurrent);

        Ok(Self {
            config,
            session,
            workers: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            collector: Arc::new(Mutex::new(MetricsCollector::new())),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn open_session(&self) -> Result<Session> {
        let estimator = RateEstimator::new(self.config.clone())?;
        Ok(self.register(estimator))
    }

    /// Session whose frames are reduced by a caller-supplied region strategy
    pub fn open_session_with_reducer(&self, reducer: Box<dyn RoiReducer>) -> Result<Session> {
        let estimator = RateEstimator::with_reducer(self.config.clone(), reducer)?;
        Ok(self.register(estimator))
    }

    fn register(&self, estimator: RateEstimator) -> Session {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let metrics = Arc::new(SessionMetrics::new(id));
        lock_collector(&self.collector).register(metrics.clone());
        info!("Session {} opened", id);

        Session {
            id,
            estimator: Arc::new(AsyncMutex::new(estimator)),
            workers: self.workers.clone(),
            metrics,
            collector: self.collector.clone(),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn session_config(&self) -> &SessionConfig {
        &self.session
    }

    pub fn active_sessions(&self) -> usize {
        lock_collector(&self.collector).len()
    }

    pub fn collector(&self) -> Arc<Mutex<MetricsCollector>> {
        self.collector.clone()
    }

    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor::new(self.collector.clone())
    }
}

fn lock_collector(collector: &Mutex<MetricsCollector>) -> std::sync::MutexGuard<'_, MetricsCollector> {
    collector.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One client's estimator state. Frames of a session are analyzed strictly in
/// order; different sessions never share a window.
///
/// The estimator stays owned by the session while a worker holds its lock, so
/// a cancelled `process` call costs only that frame's answer.
pub struct Session {
    id: u64,
    estimator: Arc<AsyncMutex<RateEstimator>>,
    workers: Arc<Semaphore>,
    metrics: Arc<SessionMetrics>,
    collector: Arc<Mutex<MetricsCollector>>,
}

impl Session {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn metrics(&self) -> Arc<SessionMetrics> {
        self.metrics.clone()
    }

    /// Analyze one encoded frame. Undecodable frames yield the degraded record
    /// and leave the window untouched.
    pub async fn process(&mut self, frame: Vec<u8>) -> Result<Estimate> {
        self.metrics.record_frame_received();
        self.analyze(frame).await
    }

    /// Same as `process`, for frames already counted as received
    pub(crate) async fn analyze(&mut self, frame: Vec<u8>) -> Result<Estimate> {
        // FIFO lock: a frame whose caller gave up still runs before the next one
        let mut estimator = self.estimator.clone().lock_owned().await;
        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| anyhow!("estimator pool closed"))?;

        let metrics = self.metrics.clone();
        let session_id = self.id;

        let estimate = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = metrics.start_processing();
            let estimate = match estimator.ingest(&frame) {
                Ok(report) => {
                    metrics.record_report(&report);
                    report.estimate
                }
                Err(e) => {
                    warn!("Session {}: dropping frame: {}", session_id, e);
                    metrics.record_decode_error();
                    Estimate::degraded()
                }
            };
            metrics.finish_processing(start);
            estimate
        })
        .await
        .map_err(|e| {
            error!("Session {}: worker failed: {}", session_id, e);
            anyhow!("session {} worker failed: {}", session_id, e)
        })?;

        debug!(
            "Session {}: bpm={:?} signal={:.3} snr={:.2}",
            session_id, estimate.bpm, estimate.signal_deviation, estimate.snr_db
        );
        Ok(estimate)
    }

    /// Samples currently held; waits for any frame still being analyzed
    pub async fn window_len(&self) -> usize {
        self.estimator.lock().await.window().len()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        lock_collector(&self.collector).unregister(self.id);
        info!(
            "Session {} closed after {} frames",
            self.id,
            self.metrics.frames_received()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_rejects_invalid_config() {
        let config = EstimatorConfig {
            window_capacity: 5,
            ..EstimatorConfig::default()
        };
        assert!(EstimatorPool::new(config, 2).is_err());
    }

    #[test]
    fn test_sessions_register_and_unregister() {
        let pool = EstimatorPool::new(EstimatorConfig::default(), 2).unwrap();
        assert_eq!(pool.max_concurrent(), 2);

        let a = pool.open_session().unwrap();
        let b = pool.open_session().unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.active_sessions(), 2);

        drop(a);
        assert_eq!(pool.active_sessions(), 1);
        drop(b);
        assert_eq!(pool.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_garbage_frame_degrades() {
        let pool = EstimatorPool::new(EstimatorConfig::default(), 1).unwrap();
        let mut session = pool.open_session().unwrap();

        let estimate = session.process(b"not an image".to_vec()).await.unwrap();
        assert_eq!(estimate, Estimate::degraded());
        assert_eq!(session.window_len().await, 0);
        assert_eq!(session.metrics().decode_errors(), 1);
        assert_eq!(session.metrics().frames_received(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_call_keeps_session_usable() {
        let pool = EstimatorPool::new(EstimatorConfig::default(), 1).unwrap();
        let mut session = pool.open_session().unwrap();

        let cancelled = tokio::time::timeout(
            std::time::Duration::from_nanos(1),
            session.process(b"not an image".to_vec()),
        )
        .await;
        drop(cancelled);

        let estimate = session.process(b"still not an image".to_vec()).await.unwrap();
        assert_eq!(estimate, Estimate::degraded());
        assert_eq!(session.metrics().frames_received(), 2);
    }
}
