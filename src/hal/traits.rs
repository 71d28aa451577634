use async_trait::async_trait;
use std::time::Duration;
use crate::core::{PlaybackSnapshot, SampleChunk};
use super::types::{SourceError, StreamError, StreamInfo};

/// Multi-channel biosignal stream the collector pulls from
#[async_trait]
pub trait SampleStream: Send {
    /// Channel layout and nominal sampling rate
    fn info(&self) -> &StreamInfo;

    fn channel_count(&self) -> usize {
        self.info().channel_count()
    }

    fn channel_names(&self) -> &[String] {
        &self.info().channel_names
    }

    fn sampling_rate(&self) -> f64 {
        self.info().sampling_rate
    }

    /// Pull whatever arrived since the previous call, waiting at most `timeout`.
    ///
    /// An empty chunk is a normal result when nothing arrived in time.
    async fn pull_chunk(&mut self, timeout: Duration) -> Result<SampleChunk, StreamError>;
}

/// Player that can report what is currently playing
#[async_trait]
pub trait PlaybackSource: Send {
    /// Fetch a fresh snapshot; `PlaybackSnapshot::Empty` when nothing plays
    async fn fetch_current(&mut self) -> Result<PlaybackSnapshot, SourceError>;
}
