use eegsync::core::{PlaybackInfo, PlaybackSnapshot, TransitionEvent};
use eegsync::engine::{MonitorConfig, MonitorError, PlaybackMonitor};
use eegsync::hal::mock::ScriptedPlaybackSource;
use eegsync::hal::SourceError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep, Duration};

fn fast(stop_debounce: u32) -> MonitorConfig {
    MonitorConfig {
        poll_interval_ms: 5,
        stop_debounce,
    }
}

fn playing(uri: &str) -> PlaybackSnapshot {
    PlaybackInfo::new(uri, uri).into()
}

fn drain(rx: &mut UnboundedReceiver<TransitionEvent>) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.transition.name());
    }
    names
}

#[tokio::test]
async fn test_polling_loop_reports_transitions_in_order() {
    let source = ScriptedPlaybackSource::new(vec![
        PlaybackSnapshot::Empty,
        playing("a"),
        playing("a"),
        playing("b"),
        PlaybackSnapshot::Empty,
    ]);
    let (monitor, mut rx) = PlaybackMonitor::with_channel(Box::new(source), &fast(0));

    monitor.start().unwrap();
    sleep(Duration::from_millis(100)).await;
    monitor.stop().unwrap();
    monitor.join().await;

    assert_eq!(drain(&mut rx), vec!["started", "changed", "stopped"]);
    assert!(monitor.current_snapshot().is_empty());
    assert!(monitor.metrics().iterations() >= 5);
}

#[tokio::test]
async fn test_nothing_is_published_after_stop() {
    let source = ScriptedPlaybackSource::new(vec![playing("a")]);
    let handle = source.handle();
    let (monitor, mut rx) = PlaybackMonitor::with_channel(Box::new(source), &fast(0));

    monitor.start().unwrap();
    sleep(Duration::from_millis(30)).await;
    monitor.stop().unwrap();
    monitor.join().await;
    assert_eq!(drain(&mut rx), vec!["started"]);

    handle.push(playing("b"));
    sleep(Duration::from_millis(30)).await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(handle.remaining(), 1);
}

#[tokio::test]
async fn test_source_failures_debounced_like_empty_polls() {
    let source = ScriptedPlaybackSource::new(vec![playing("a")]);
    let handle = source.handle();
    handle.push_failure(SourceError::Http(503));
    handle.push(playing("a"));
    handle.push_failure(SourceError::Timeout);
    handle.push_failure(SourceError::Timeout);
    handle.push(PlaybackSnapshot::Empty);

    let (monitor, mut rx) = PlaybackMonitor::with_channel(Box::new(source), &fast(1));

    monitor.start().unwrap();
    sleep(Duration::from_millis(100)).await;
    monitor.stop().unwrap();
    monitor.join().await;

    assert_eq!(drain(&mut rx), vec!["started", "stopped"]);
    assert_eq!(monitor.metrics().errors(), 3);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let source = ScriptedPlaybackSource::new(Vec::new());
    let (monitor, _rx) = PlaybackMonitor::with_channel(Box::new(source), &fast(0));

    assert_eq!(monitor.stop(), Err(MonitorError::NotRunning));
    monitor.start().unwrap();
    monitor.stop().unwrap();
    monitor.join().await;

    monitor.start().unwrap();
    assert!(monitor.is_running());
    monitor.stop().unwrap();
    monitor.join().await;
}
