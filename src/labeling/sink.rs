use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Failure reported by a playlist service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("playlist service answered HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("playlist service unavailable: {0}")]
    Unavailable(String),
}

/// Named collection of items that can be appended to
#[async_trait]
pub trait PlaylistSink: Send + Sync {
    async fn add_item(&self, collection_id: &str, item_uri: &str) -> Result<(), SinkError>;
}

/// Sink that remembers every addition; can be told to fail
#[derive(Default)]
pub struct RecordingPlaylistSink {
    added: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<SinkError>>,
}

impl RecordingPlaylistSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every following call with `error`
    pub fn fail_with(&self, error: SinkError) {
        *self.failure.lock() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    /// `(collection_id, item_uri)` pairs in call order
    pub fn added(&self) -> Vec<(String, String)> {
        self.added.lock().clone()
    }
}

#[async_trait]
impl PlaylistSink for RecordingPlaylistSink {
    async fn add_item(&self, collection_id: &str, item_uri: &str) -> Result<(), SinkError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        self.added
            .lock()
            .push((collection_id.to_string(), item_uri.to_string()));
        Ok(())
    }
}
