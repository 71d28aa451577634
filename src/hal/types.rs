use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by a sample stream
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream disconnected")]
    Disconnected,

    #[error("stream read failed: {0}")]
    Read(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a playback source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("player access token unavailable")]
    Unauthorized,

    #[error("player request failed with HTTP {0}")]
    Http(u16),

    #[error("malformed player payload: {0}")]
    Payload(String),

    #[error("player request timed out")]
    Timeout,
}

/// Description of a connected sample stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub name: String,
    pub channel_names: Vec<String>,

    /// Nominal sampling rate in Hz
    pub sampling_rate: f64,
}

impl StreamInfo {
    pub fn new(name: impl Into<String>, channel_names: Vec<String>, sampling_rate: f64) -> Self {
        Self {
            name: name.into(),
            channel_names,
            sampling_rate,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channel_names.len()
    }
}

impl Default for StreamInfo {
    /// Four-electrode headband plus the auxiliary input
    fn default() -> Self {
        Self::new(
            "Muse",
            ["TP9", "AF7", "AF8", "TP10", "Right AUX"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
            256.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream_layout() {
        let info = StreamInfo::default();
        assert_eq!(info.channel_count(), 5);
        assert_eq!(info.sampling_rate, 256.0);
        assert_eq!(info.channel_names[4], "Right AUX");
    }
}
