use crate::core::{record_id, DataFrame, EpochMarkers, PlaybackInfo, PlaybackSnapshot, Transition, TransitionEvent};
use crate::hal::PlaybackSource;
use crate::labeling::PlaylistLabeler;
use crate::resilience::PersistPolicy;
use crate::storage::RecordStore;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task;
use tokio::time::Duration;
use super::collector::DataCollector;
use super::monitor::{MonitorConfig, PlaybackMonitor};
use super::worker::LoopSlot;
use super::SessionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Also write a record when playback stops, not only on item changes
    pub persist_on_stop: bool,

    pub persist_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let policy = PersistPolicy::default();
        Self {
            persist_on_stop: false,
            persist_attempts: policy.attempts,
            retry_backoff_ms: policy.backoff.as_millis() as u64,
        }
    }
}

impl SessionConfig {
    pub fn persist_policy(&self) -> PersistPolicy {
        PersistPolicy::new(self.persist_attempts, Duration::from_millis(self.retry_backoff_ms))
    }
}

/// Item, label and markers of the current epoch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochState {
    /// Item the epoch was opened for
    pub playback: Option<PlaybackInfo>,
    pub label: Option<String>,
    pub markers: EpochMarkers,
}

impl EpochState {
    fn starting_at(playback: PlaybackInfo, timestamp: DateTime<Utc>) -> Self {
        Self {
            playback: Some(playback),
            label: None,
            markers: EpochMarkers::starting_at(timestamp),
        }
    }
}

/// Notifications about epoch bookkeeping
#[derive(Debug, Clone)]
pub enum SessionEvent {
    EpochStarted { timestamp: DateTime<Utc> },
    EpochClosed { timestamp: DateTime<Utc> },
    EpochPersisted { record_id: String, samples: usize },

    /// Every write attempt failed; the frame is attached so it can be kept
    PersistFailed {
        record_id: String,
        error: String,
        frame: Box<DataFrame>,
    },
}

/// What handling one transition did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpochOutcome {
    Started,
    Closed,
    Persisted { record_id: String },
}

pub type SessionEventCallback = Box<dyn Fn(SessionEvent) + Send + Sync>;

struct SessionCore {
    userid: String,
    collector: Arc<DataCollector>,
    store: Arc<dyn RecordStore>,
    config: SessionConfig,
    epoch: Mutex<EpochState>,
    event_callback: RwLock<Option<SessionEventCallback>>,
}

impl SessionCore {
    fn emit(&self, event: SessionEvent) {
        if let Some(callback) = self.event_callback.read().as_ref() {
            callback(event);
        }
    }

    /// Close the epoch in `epoch` and turn it into a record for `playback`.
    /// The caller holds the epoch lock; the buffer lock is taken after it.
    fn close_epoch(&self, epoch: &EpochState, playback: PlaybackInfo) -> DataFrame {
        let (eeg, timestamps) = self.collector.drain();
        DataFrame::new(
            self.userid.clone(),
            playback,
            epoch.label.clone(),
            epoch.markers,
            eeg,
            timestamps,
        )
    }

    async fn handle(&self, event: TransitionEvent) -> Result<EpochOutcome, SessionError> {
        let timestamp = event.timestamp;

        match event.transition {
            Transition::Started { new } => {
                log::info!("Epoch started with '{}' at {}", new.song, timestamp);
                {
                    let mut epoch = self.epoch.lock();
                    self.collector.clear();
                    *epoch = EpochState::starting_at(new, timestamp);
                }
                self.emit(SessionEvent::EpochStarted { timestamp });
                Ok(EpochOutcome::Started)
            }
            Transition::Stopped { old } => {
                let closed = {
                    let mut epoch = self.epoch.lock();
                    epoch.markers.end = Some(timestamp);
                    self.config
                        .persist_on_stop
                        .then(|| self.close_epoch(&epoch, old))
                };
                log::info!("Playback stopped, epoch closed at {}", timestamp);
                self.emit(SessionEvent::EpochClosed { timestamp });

                match closed {
                    Some(frame) => self.persist(timestamp, frame).await,
                    None => Ok(EpochOutcome::Closed),
                }
            }
            Transition::Changed { old, new } => {
                log::info!("Playback moved on to '{}' at {}", new.song, timestamp);
                let frame = {
                    let mut epoch = self.epoch.lock();
                    epoch.markers.end = Some(timestamp);
                    let frame = self.close_epoch(&epoch, old);
                    *epoch = EpochState::starting_at(new, timestamp);
                    frame
                };
                self.emit(SessionEvent::EpochClosed { timestamp });
                self.emit(SessionEvent::EpochStarted { timestamp });

                self.persist(timestamp, frame).await
            }
        }
    }

    /// Write `frame` with retries; store writes run on the blocking pool
    async fn persist(&self, timestamp: DateTime<Utc>, frame: DataFrame) -> Result<EpochOutcome, SessionError> {
        let record_id = record_id(timestamp);
        let what = format!("Persisting epoch record {}", record_id);
        let shared = Arc::new(frame);

        let written = self
            .config
            .persist_policy()
            .run(&what, || {
                let store = Arc::clone(&self.store);
                let frame = Arc::clone(&shared);
                let record_id = record_id.clone();

                async move {
                    match task::spawn_blocking(move || store.persist(&record_id, &frame)).await {
                        Ok(result) => result,
                        Err(e) => Err(anyhow::Error::new(e).context("record writer task failed")),
                    }
                }
            })
            .await;

        let frame = Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone());

        match written {
            Ok(()) => {
                log::info!("Epoch record {} saved ({} samples)", record_id, frame.sample_count());
                self.emit(SessionEvent::EpochPersisted {
                    record_id: record_id.clone(),
                    samples: frame.sample_count(),
                });
                Ok(EpochOutcome::Persisted { record_id })
            }
            Err(source) => Err(SessionError::Persist {
                record_id,
                frame: Box::new(frame),
                source,
            }),
        }
    }

    /// Dispatcher entry point; failures are reported, never propagated
    async fn dispatch(&self, event: TransitionEvent) {
        match self.handle(event).await {
            Ok(_) => {}
            Err(SessionError::Persist {
                record_id,
                frame,
                source,
            }) => {
                log::error!("Epoch record {} was not saved: {:#}", record_id, source);
                self.emit(SessionEvent::PersistFailed {
                    record_id,
                    error: format!("{:#}", source),
                    frame,
                });
            }
            Err(e) => log::error!("Failed to handle playback transition: {}", e),
        }
    }
}

/// One data collection session.
///
/// Reacts to the transitions published by its playback monitor: every item
/// change closes the current epoch, writes it as a `DataFrame` through the
/// record store and opens the next epoch at the same instant.
pub struct Session {
    core: Arc<SessionCore>,
    monitor: PlaybackMonitor,
    events: Arc<AsyncMutex<UnboundedReceiver<TransitionEvent>>>,
    dispatcher: LoopSlot,
    labeler: Option<PlaylistLabeler>,
}

impl Session {
    pub fn new(
        userid: impl Into<String>,
        config: SessionConfig,
        monitor_config: &MonitorConfig,
        collector: Arc<DataCollector>,
        source: Box<dyn PlaybackSource>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let (monitor, events) = PlaybackMonitor::with_channel(source, monitor_config);

        Self {
            core: Arc::new(SessionCore {
                userid: userid.into(),
                collector,
                store,
                config,
                epoch: Mutex::new(EpochState::default()),
                event_callback: RwLock::new(None),
            }),
            monitor,
            events: Arc::new(AsyncMutex::new(events)),
            dispatcher: LoopSlot::new(),
            labeler: None,
        }
    }

    /// Add labeled items to playlists
    pub fn with_labeler(mut self, labeler: PlaylistLabeler) -> Self {
        self.labeler = Some(labeler);
        self
    }

    pub fn set_event_callback<F>(&self, callback: F)
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        *self.core.event_callback.write() = Some(Box::new(callback));
    }

    /// Start polling playback and handling its transitions
    pub fn start(&self) -> Result<(), SessionError> {
        self.monitor.start()?;

        let core = Arc::clone(&self.core);
        let events = Arc::clone(&self.events);
        self.dispatcher.try_start("session-dispatcher", move |token| async move {
            let mut events = events.lock().await;
            loop {
                // queued transitions are handled before a stop request
                let event = tokio::select! {
                    biased;
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                    _ = token.cancelled() => break,
                };
                core.dispatch(event).await;
            }
        });

        log::info!("Session started for user {}", self.core.userid);
        Ok(())
    }

    /// Stop polling; transitions already detected are still handled
    pub fn stop(&self) -> Result<(), SessionError> {
        self.monitor.stop()?;
        log::info!("Session stopping");
        Ok(())
    }

    /// Wait for the monitor to exit, then for the dispatcher to drain
    pub async fn join(&self) {
        self.monitor.join().await;
        self.dispatcher.request_stop();
        self.dispatcher.join().await;
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Apply one transition directly, bypassing the monitor
    pub async fn handle_transition(&self, event: TransitionEvent) -> Result<EpochOutcome, SessionError> {
        self.core.handle(event).await
    }

    /// Label the current epoch; the epoch's item is also added to the
    /// label's playlist when a labeler is configured
    pub async fn set_label(&self, label: &str) -> Result<(), SessionError> {
        let playback = {
            let mut epoch = self.core.epoch.lock();
            if !epoch.markers.is_open() {
                return Err(SessionError::NoActiveEpoch);
            }
            epoch.label = Some(label.to_string());
            epoch.markers.labeling = Some(Utc::now());
            epoch.playback.clone()
        };
        log::info!("Current epoch labeled '{}'", label);

        // the epoch's item, which may lag the monitor's latest snapshot
        if let Some(labeler) = &self.labeler {
            let snapshot = PlaybackSnapshot::from(playback);
            match labeler.add_current(label, &snapshot).await {
                Ok(playlist) => log::debug!("Labeled item added to playlist {}", playlist),
                Err(e) => log::error!("Could not add labeled item to playlist: {}", e),
            }
        }
        Ok(())
    }

    pub fn epoch(&self) -> EpochState {
        self.core.epoch.lock().clone()
    }

    pub fn label(&self) -> Option<String> {
        self.core.epoch.lock().label.clone()
    }

    pub fn markers(&self) -> EpochMarkers {
        self.core.epoch.lock().markers
    }

    pub fn userid(&self) -> &str {
        &self.core.userid
    }

    pub fn monitor(&self) -> &PlaybackMonitor {
        &self.monitor
    }

    pub fn collector(&self) -> &Arc<DataCollector> {
        &self.core.collector
    }
}
