use crate::buffers::{BufferBound, SampleBuffer};
use crate::core::Sample;
use crate::hal::{SampleStream, StreamError, StreamInfo};
use crate::observability::LoopMetrics;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, Duration};
use super::worker::LoopSlot;
use super::{CollectorError, LoopState};

/// Ten minutes of a 256 Hz stream
pub const DEFAULT_BUFFER_LIMIT: NonZeroUsize = match NonZeroUsize::new(256 * 600) {
    Some(limit) => limit,
    None => panic!("default buffer limit must be non-zero"),
};

/// Pause after a pull that returned no samples
const EMPTY_PULL_BACKOFF: Duration = Duration::from_millis(10);

/// Collector settings as they appear in the app config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Retention limit of the sample buffer
    pub buffer: BufferBound,

    /// Upper bound on a single blocking pull
    pub pull_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            buffer: BufferBound::Bounded(DEFAULT_BUFFER_LIMIT),
            pull_timeout_ms: 100,
        }
    }
}

/// Pulls sample chunks from a stream on a background task and keeps them in
/// a bounded buffer.
///
/// The buffer lock is held only while a pulled chunk is appended, never
/// across the pull itself. Readers always receive copies.
pub struct DataCollector {
    stream: Arc<AsyncMutex<Box<dyn SampleStream>>>,
    info: StreamInfo,
    buffer: Arc<Mutex<SampleBuffer>>,
    pull_timeout: Duration,
    worker: LoopSlot,
    metrics: Arc<LoopMetrics>,
}

impl DataCollector {
    /// Create a collector; the sample arity is taken from the stream
    pub fn new(stream: Box<dyn SampleStream>, bound: BufferBound, pull_timeout: Duration) -> Self {
        let info = stream.info().clone();
        let buffer = SampleBuffer::new(info.channel_count(), bound);

        Self {
            stream: Arc::new(AsyncMutex::new(stream)),
            info,
            buffer: Arc::new(Mutex::new(buffer)),
            pull_timeout,
            worker: LoopSlot::new(),
            metrics: Arc::new(LoopMetrics::new("collector")),
        }
    }

    pub fn from_config(stream: Box<dyn SampleStream>, config: &CollectorConfig) -> Self {
        Self::new(stream, config.buffer, Duration::from_millis(config.pull_timeout_ms))
    }

    /// Start the sampling loop
    pub fn start(&self) -> Result<(), CollectorError> {
        let stream = Arc::clone(&self.stream);
        let buffer = Arc::clone(&self.buffer);
        let metrics = Arc::clone(&self.metrics);
        let timeout = self.pull_timeout;

        let started = self.worker.try_start("collector", move |token| async move {
            let mut stream = stream.lock().await;

            while !token.is_cancelled() {
                metrics.record_iteration();
                let start = metrics.start_timing();

                match stream.pull_chunk(timeout).await {
                    Ok(chunk) => {
                        metrics.finish_timing(start);
                        if chunk.is_empty() {
                            sleep(EMPTY_PULL_BACKOFF).await;
                            continue;
                        }

                        let appended = buffer.lock().append(chunk);
                        match appended {
                            Ok(count) => metrics.record_items(count as u64),
                            Err(e) => {
                                metrics.record_rejected();
                                log::warn!("Dropping malformed sample chunk: {}", e);
                            }
                        }
                    }
                    Err(StreamError::Disconnected) => {
                        metrics.record_error();
                        log::error!("Sample stream disconnected, collector exiting");
                        break;
                    }
                    Err(e) => {
                        metrics.record_error();
                        log::warn!("Sample pull failed, retrying: {}", e);
                        sleep(timeout).await;
                    }
                }
            }
        });

        if !started {
            return Err(CollectorError::AlreadyRunning);
        }

        log::info!(
            "Data collector started: {} channels @ {} Hz",
            self.info.channel_count(),
            self.info.sampling_rate
        );
        Ok(())
    }

    /// Ask the sampling loop to exit after its current pull
    pub fn stop(&self) -> Result<(), CollectorError> {
        if !self.worker.request_stop() {
            return Err(CollectorError::NotRunning);
        }
        log::info!("Stopping data collector");
        Ok(())
    }

    /// Wait until the sampling loop has exited
    pub async fn join(&self) {
        self.worker.join().await;
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_running()
    }

    pub fn state(&self) -> LoopState {
        self.worker.state()
    }

    /// Reset to a single all-zero sample and no timestamps
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// Copy of the buffered samples
    pub fn get_data(&self) -> Vec<Sample> {
        self.buffer.lock().samples()
    }

    /// Copy of the buffered sample timestamps
    pub fn get_timestamps(&self) -> Vec<f64> {
        self.buffer.lock().timestamps()
    }

    /// Copy samples and timestamps and clear, in one critical section
    pub fn drain(&self) -> (Vec<Sample>, Vec<f64>) {
        self.buffer.lock().take()
    }

    /// Number of buffered samples, placeholder included
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.info.channel_count()
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn metrics(&self) -> Arc<LoopMetrics> {
        Arc::clone(&self.metrics)
    }
}
