use crate::core::{PlaybackSnapshot, TransitionEvent};
use crate::hal::PlaybackSource;
use crate::observability::LoopMetrics;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, Duration};
use super::detector::TransitionDetector;
use super::worker::LoopSlot;
use super::{LoopState, MonitorError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,

    /// Extra consecutive empty polls required before a stop is reported
    pub stop_debounce: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            stop_debounce: 0,
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

struct MonitorCore {
    source: AsyncMutex<Box<dyn PlaybackSource>>,
    detector: Mutex<TransitionDetector>,
    events: UnboundedSender<TransitionEvent>,
    metrics: Arc<LoopMetrics>,
}

impl MonitorCore {
    /// One poll. Returns `false` once nobody listens for events anymore.
    async fn tick(&self) -> bool {
        self.metrics.record_iteration();
        let start = self.metrics.start_timing();

        let fetched = self.source.lock().await.fetch_current().await;
        self.metrics.finish_timing(start);

        let snapshot = fetched.unwrap_or_else(|e| {
            self.metrics.record_error();
            log::warn!("Playback poll failed, treating as nothing playing: {}", e);
            PlaybackSnapshot::Empty
        });

        let event = self.detector.lock().observe(snapshot, Utc::now());
        let Some(event) = event else {
            return true;
        };

        log::info!("Playback {} at {}", event.transition.name(), event.timestamp);
        self.metrics.record_items(1);
        if self.events.send(event).is_err() {
            log::warn!("Transition receiver dropped, playback monitor exiting");
            return false;
        }
        true
    }
}

/// Polls a playback source at a fixed interval and publishes the transitions
/// it detects on a channel.
///
/// Events are delivered in poll order. Delivery never waits on the consumer,
/// so a slow consumer does not stretch the polling interval.
pub struct PlaybackMonitor {
    core: Arc<MonitorCore>,
    poll_interval: Duration,
    worker: LoopSlot,
}

impl PlaybackMonitor {
    pub fn new(
        source: Box<dyn PlaybackSource>,
        config: &MonitorConfig,
        events: UnboundedSender<TransitionEvent>,
    ) -> Self {
        Self {
            core: Arc::new(MonitorCore {
                source: AsyncMutex::new(source),
                detector: Mutex::new(TransitionDetector::new(config.stop_debounce)),
                events,
                metrics: Arc::new(LoopMetrics::new("monitor")),
            }),
            poll_interval: config.poll_interval(),
            worker: LoopSlot::new(),
        }
    }

    /// Create a monitor together with the receiving end of its event channel
    pub fn with_channel(
        source: Box<dyn PlaybackSource>,
        config: &MonitorConfig,
    ) -> (Self, UnboundedReceiver<TransitionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(source, config, tx), rx)
    }

    pub fn start(&self) -> Result<(), MonitorError> {
        let core = Arc::clone(&self.core);
        let interval = self.poll_interval;

        let started = self.worker.try_start("monitor", move |token| async move {
            while !token.is_cancelled() {
                if !core.tick().await {
                    break;
                }

                tokio::select! {
                    _ = sleep(interval) => {}
                    _ = token.cancelled() => break,
                }
            }
        });

        if !started {
            return Err(MonitorError::AlreadyRunning);
        }
        log::info!("Playback monitor polling every {:?}", interval);
        Ok(())
    }

    /// Stop polling. No event is published after the loop has exited.
    pub fn stop(&self) -> Result<(), MonitorError> {
        if !self.worker.request_stop() {
            return Err(MonitorError::NotRunning);
        }
        log::info!("Stopping playback monitor");
        Ok(())
    }

    pub async fn join(&self) {
        self.worker.join().await;
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    pub fn state(&self) -> LoopState {
        self.worker.state()
    }

    /// Poll once outside the loop
    pub async fn poll_once(&self) -> bool {
        self.core.tick().await
    }

    /// Last confirmed playback snapshot
    pub fn current_snapshot(&self) -> PlaybackSnapshot {
        self.core.detector.lock().previous().clone()
    }

    pub fn metrics(&self) -> Arc<LoopMetrics> {
        Arc::clone(&self.core.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlaybackInfo;
    use crate::hal::mock::ScriptedPlaybackSource;
    use crate::hal::SourceError;

    #[tokio::test]
    async fn test_poll_once_publishes_transitions() {
        let source = ScriptedPlaybackSource::new(vec![
            PlaybackSnapshot::Empty,
            PlaybackInfo::new("a", "A").into(),
        ]);
        let (monitor, mut rx) = PlaybackMonitor::with_channel(Box::new(source), &MonitorConfig::default());

        monitor.poll_once().await;
        assert!(rx.try_recv().is_err());

        monitor.poll_once().await;
        let event = rx.try_recv().unwrap();
        assert_eq!(event.transition.name(), "started");
        assert_eq!(monitor.current_snapshot().identity(), Some("a"));
    }

    #[tokio::test]
    async fn test_failed_poll_counts_as_empty() {
        let source = ScriptedPlaybackSource::new(vec![PlaybackInfo::new("a", "A").into()]);
        source.handle().push_failure(SourceError::Timeout);
        let (monitor, mut rx) = PlaybackMonitor::with_channel(Box::new(source), &MonitorConfig::default());

        monitor.poll_once().await;
        monitor.poll_once().await;

        assert_eq!(rx.try_recv().unwrap().transition.name(), "started");
        assert_eq!(rx.try_recv().unwrap().transition.name(), "stopped");
        assert_eq!(monitor.metrics().errors(), 1);
    }

    #[tokio::test]
    async fn test_closed_receiver_ends_poll() {
        let source = ScriptedPlaybackSource::new(vec![PlaybackInfo::new("a", "A").into()]);
        let (monitor, rx) = PlaybackMonitor::with_channel(Box::new(source), &MonitorConfig::default());
        drop(rx);

        assert!(!monitor.poll_once().await);
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let source = ScriptedPlaybackSource::new(Vec::new());
        let config = MonitorConfig {
            poll_interval_ms: 10,
            stop_debounce: 0,
        };
        let (monitor, _rx) = PlaybackMonitor::with_channel(Box::new(source), &config);

        monitor.start().unwrap();
        assert_eq!(monitor.start(), Err(MonitorError::AlreadyRunning));

        monitor.stop().unwrap();
        monitor.join().await;
        assert_eq!(monitor.stop(), Err(MonitorError::NotRunning));
    }
}
