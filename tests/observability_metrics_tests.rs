use pulsetab::engine::EstimatorPool;
use pulsetab::estimator::{FrameReport, RatePath};
use pulsetab::observability::{MetricsCollector, MetricsSnapshot, SessionMetrics, SessionMonitor};
use pulsetab::{Estimate, EstimatorConfig};
use std::sync::{Arc, Mutex};

fn report(path: RatePath) -> FrameReport {
    FrameReport {
        estimate: Estimate::degraded(),
        path,
    }
}

#[test]
fn test_reports_counted_by_path() {
    let metrics = SessionMetrics::new(7);
    for path in [
        RatePath::Filling,
        RatePath::Peaks,
        RatePath::Spectral,
        RatePath::Spectral,
        RatePath::Inconclusive,
        RatePath::Rejected,
    ] {
        metrics.record_report(&report(path));
    }

    let snapshot = MetricsSnapshot::of(&metrics);
    assert_eq!(snapshot.session_id, 7);
    assert_eq!(snapshot.frames_processed, 5);
    assert_eq!(snapshot.spectral_fallbacks, 2);
    assert_eq!(snapshot.inconclusive_windows, 1);
    assert_eq!(snapshot.decode_errors, 1);
}

#[tokio::test]
async fn test_latency_tracking() {
    let metrics = SessionMetrics::new(1);
    assert_eq!(metrics.avg_latency_us(), 0);

    let start = metrics.start_processing();
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    metrics.finish_processing(start);

    assert!(metrics.avg_latency_us() >= 10_000);
}

#[test]
fn test_collector_register_unregister() {
    let mut collector = MetricsCollector::new();
    let metrics = Arc::new(SessionMetrics::new(3));
    collector.register(metrics.clone());
    metrics.record_frame_received();

    assert_eq!(collector.len(), 1);
    assert_eq!(collector.snapshot()[&3].frames_received, 1);
    assert!(collector.get_session_metrics(3).is_some());

    assert!(collector.unregister(3).is_some());
    assert!(collector.is_empty());
    assert!(collector.get_session_metrics(3).is_none());
}

#[test]
fn test_monitor_report() {
    let collector = Arc::new(Mutex::new(MetricsCollector::new()));
    let monitor = SessionMonitor::new(collector.clone());
    assert_eq!(monitor.generate_report(), "No active sessions");

    let metrics = Arc::new(SessionMetrics::new(42));
    metrics.record_frame_received();
    metrics.record_frame_dropped();
    collector.lock().unwrap().register(metrics);

    let report = monitor.generate_report();
    assert!(report.contains("[session 42]"));
    assert!(report.contains("1 received, 0 processed, 1 dropped"));
}

#[tokio::test]
async fn test_pool_monitor_follows_sessions() {
    let pool = EstimatorPool::new(EstimatorConfig::default(), 1).unwrap();
    let mut session = pool.open_session().unwrap();
    session.process(b"nope".to_vec()).await.unwrap();

    let report = pool.monitor().generate_report();
    assert!(report.contains(&format!("[session {}]", session.id())));
    assert!(report.contains("Decode errors: 1"));

    drop(session);
    assert_eq!(pool.monitor().generate_report(), "No active sessions");
}
