use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use super::{FrameQueue, Session};
use crate::config::SessionConfig;
use crate::core::Estimate;

/// Inbound half of a duplex transport; `None` means the peer disconnected
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Option<Vec<u8>>;
}

/// Outbound half of a duplex transport
#[async_trait]
pub trait EstimateSink: Send {
    async fn send_estimate(&mut self, estimate: Estimate) -> Result<()>;
}

#[async_trait]
impl FrameSource for mpsc::Receiver<Vec<u8>> {
    async fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.recv().await
    }
}

#[async_trait]
impl EstimateSink for mpsc::Sender<Estimate> {
    async fn send_estimate(&mut self, estimate: Estimate) -> Result<()> {
        self.send(estimate)
            .await
            .map_err(|_| anyhow!("estimate receiver closed"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub frames_processed: u64,

    /// Frames lost to queue overflow or discarded at disconnect
    pub frames_dropped: u64,

    /// The sink went away before the source did
    pub sink_closed: bool,
}

/// Drive one session over a duplex transport until the source disconnects or
/// the sink closes. Consumes the session; its window is released on return.
pub async fn run_stream<S, K>(
    mut session: Session,
    mut source: S,
    sink: &mut K,
    config: &SessionConfig,
) -> Result<StreamSummary>
where
    S: FrameSource + 'static,
    K: EstimateSink + ?Sized,
{
    config.validate()?;

    let queue = FrameQueue::new(config.queue_capacity, config.overflow_policy);
    let notify = Arc::new(Notify::new());
    let disconnected = Arc::new(AtomicBool::new(false));
    let metrics = session.metrics();
    let session_id = session.id();

    let reader = {
        let queue = queue.clone();
        let notify = notify.clone();
        let disconnected = disconnected.clone();
        let metrics = metrics.clone();
        tokio::spawn(async move {
            while let Some(frame) = source.next_frame().await {
                metrics.record_frame_received();
                let admission = queue.push(frame);
                if admission.dropped_a_frame() {
                    warn!("Session {}: queue full, {:?}", session_id, admission);
                    metrics.record_frame_dropped();
                }
                notify.notify_one();
            }
            disconnected.store(true, Ordering::Release);
            notify.notify_one();
        })
    };

    let mut summary = StreamSummary::default();
    let outcome = loop {
        if disconnected.load(Ordering::Acquire) {
            info!("Session {}: transport disconnected", session_id);
            break Ok(());
        }

        let Some(frame) = queue.pop() else {
            notify.notified().await;
            continue;
        };

        let estimate = match session.analyze(frame).await {
            Ok(estimate) => estimate,
            Err(e) => break Err(e),
        };

        // No partial flush once the peer is gone
        if disconnected.load(Ordering::Acquire) {
            info!("Session {}: transport disconnected mid-frame", session_id);
            break Ok(());
        }

        if sink.send_estimate(estimate).await.is_err() {
            info!("Session {}: sink closed", session_id);
            summary.sink_closed = true;
            break Ok(());
        }
        summary.frames_processed += 1;
    };

    reader.abort();
    let discarded = queue.clear();
    if discarded > 0 {
        debug!("Session {}: discarding {} queued frames", session_id, discarded);
    }
    for _ in 0..discarded {
        metrics.record_frame_dropped();
    }
    summary.frames_dropped = metrics.frames_dropped();

    drop(session);
    outcome.map(|()| summary)
}
