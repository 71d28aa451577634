use std::sync::Arc;
use serde::Serialize;
use thiserror::Error;
use crate::config::AppConfig;
use crate::engine::{CollectorError, DataCollector, Session, SessionError};
use crate::hal::{PlaybackSource, SampleStream};
use crate::labeling::{PlaylistLabeler, PlaylistSink};
use crate::observability::{MetricsRegistry, StatusReport};
use crate::storage::RecordStore;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no sample stream is connected")]
    StreamNotConnected,

    #[error("a sample stream is already connected")]
    StreamAlreadyConnected,

    #[error("data collection needs to be started first")]
    CollectorNotRunning,

    #[error("no session exists")]
    NoSession,

    #[error("a session is already running")]
    SessionAlreadyRunning,

    #[error(transparent)]
    Collector(#[from] CollectorError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Which parts of the pipeline are up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Status {
    pub stream: bool,
    pub collector: bool,
    pub session: bool,
}

/// Settings exposed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigView {
    pub labels: Vec<String>,
}

/// Owns the stream, collector and session of one running application and
/// enforces the order in which they are brought up.
pub struct CollectionContext {
    config: AppConfig,
    store: Arc<dyn RecordStore>,
    stream: Option<Box<dyn SampleStream>>,
    collector: Option<Arc<DataCollector>>,
    session: Option<Session>,
    metrics: MetricsRegistry,
}

impl CollectionContext {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config,
            store,
            stream: None,
            collector: None,
            session: None,
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn has_stream(&self) -> bool {
        self.stream.is_some() || self.collector.is_some()
    }

    pub fn connect_stream(&mut self, stream: Box<dyn SampleStream>) -> Result<(), ContextError> {
        if self.has_stream() {
            return Err(ContextError::StreamAlreadyConnected);
        }

        log::info!("Connected to stream '{}'", stream.info().name);
        self.stream = Some(stream);
        Ok(())
    }

    /// Tear everything down and release the stream
    pub async fn disconnect_stream(&mut self) -> Result<(), ContextError> {
        if !self.has_stream() {
            return Err(ContextError::StreamNotConnected);
        }

        if let Some(session) = self.session.take() {
            // a session that was stopped already answers NotRunning
            let _ = session.stop();
            session.join().await;
            self.metrics.unregister("monitor");
        }

        if let Some(collector) = self.collector.take() {
            let _ = collector.stop();
            collector.join().await;
            self.metrics.unregister("collector");
        }

        self.stream = None;
        log::info!("Sample stream disconnected");
        Ok(())
    }

    /// Start sampling the connected stream; a stopped collector is resumed
    pub fn start_collector(&mut self) -> Result<(), ContextError> {
        if let Some(collector) = &self.collector {
            collector.start()?;
            return Ok(());
        }

        let stream = self.stream.take().ok_or(ContextError::StreamNotConnected)?;
        let collector = Arc::new(DataCollector::from_config(stream, &self.config.collector));
        collector.start()?;

        self.metrics.register("collector", collector.metrics());
        self.collector = Some(collector);
        Ok(())
    }

    pub async fn stop_collector(&mut self) -> Result<(), ContextError> {
        let collector = self.collector.as_ref().ok_or(ContextError::CollectorNotRunning)?;
        collector.stop()?;
        collector.join().await;
        Ok(())
    }

    /// Start a session on top of the running collector. With a sink, labeled
    /// items are also added to the configured playlists.
    pub fn start_session(
        &mut self,
        source: Box<dyn PlaybackSource>,
        sink: Option<Arc<dyn PlaylistSink>>,
    ) -> Result<(), ContextError> {
        let collector = match &self.collector {
            Some(collector) if collector.is_running() => Arc::clone(collector),
            _ => return Err(ContextError::CollectorNotRunning),
        };

        if self.session.as_ref().is_some_and(Session::is_running) {
            return Err(ContextError::SessionAlreadyRunning);
        }

        let mut session = Session::new(
            self.config.userid.clone(),
            self.config.session.clone(),
            &self.config.monitor,
            collector,
            source,
            Arc::clone(&self.store),
        );

        if let Some(sink) = sink {
            session = session.with_labeler(PlaylistLabeler::new(
                self.config.labels_to_playlists.clone(),
                self.config.playlists.clone(),
                sink,
            ));
        }

        session.start()?;
        self.metrics.register("monitor", session.monitor().metrics());
        self.session = Some(session);
        Ok(())
    }

    /// Stop the session and wait until detected transitions are handled.
    /// The session is kept so its last epoch can still be labeled.
    pub async fn stop_session(&mut self) -> Result<(), ContextError> {
        let session = self.session.as_ref().ok_or(ContextError::NoSession)?;
        session.stop()?;
        session.join().await;
        Ok(())
    }

    pub async fn label(&self, label: &str) -> Result<(), ContextError> {
        let session = self.session.as_ref().ok_or(ContextError::NoSession)?;
        session.set_label(label).await?;
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn collector(&self) -> Option<&Arc<DataCollector>> {
        self.collector.as_ref()
    }

    pub fn status(&self) -> Status {
        Status {
            stream: self.has_stream(),
            collector: self.collector.as_ref().is_some_and(|c| c.is_running()),
            session: self.session.as_ref().is_some_and(Session::is_running),
        }
    }

    pub fn status_report(&self) -> String {
        StatusReport::new(self.metrics.clone()).generate_report()
    }

    pub fn config_view(&self) -> ConfigView {
        ConfigView {
            labels: self.config.labels(),
        }
    }
}
