use thiserror::Error;
use crate::core::DataFrame;

/// Misuse of the collector lifecycle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectorError {
    #[error("data collector is already running")]
    AlreadyRunning,

    #[error("data collector is not running")]
    NotRunning,
}

/// Misuse of the playback monitor lifecycle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    #[error("playback monitor is already polling")]
    AlreadyRunning,

    #[error("playback monitor is not polling")]
    NotRunning,
}

/// Errors surfaced by session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is already running")]
    AlreadyRunning,

    #[error("session is not running")]
    NotRunning,

    #[error("no active epoch to label")]
    NoActiveEpoch,

    /// The epoch record could not be written; the frame is handed back so the
    /// caller can keep it
    #[error("failed to persist epoch record {record_id}: {source}")]
    Persist {
        record_id: String,
        frame: Box<DataFrame>,
        #[source]
        source: anyhow::Error,
    },
}

impl From<MonitorError> for SessionError {
    fn from(e: MonitorError) -> Self {
        match e {
            MonitorError::AlreadyRunning => Self::AlreadyRunning,
            MonitorError::NotRunning => Self::NotRunning,
        }
    }
}
