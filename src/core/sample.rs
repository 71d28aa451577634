use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One reading per channel, in stream channel order
pub type Sample = Vec<f64>;

/// Reasons a pulled chunk cannot be appended to a buffer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    #[error("sample {index} has {actual} channels, expected {expected}")]
    ArityMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("chunk has {samples} samples but {timestamps} timestamps")]
    TimestampMismatch { samples: usize, timestamps: usize },
}

/// Batch of samples returned by a single stream pull
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleChunk {
    pub samples: Vec<Sample>,

    /// Source timestamps in seconds, one per sample
    pub timestamps: Vec<f64>,
}

impl SampleChunk {
    pub fn new(samples: Vec<Sample>, timestamps: Vec<f64>) -> Self {
        Self { samples, timestamps }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check every sample carries `channels` readings and every sample has a timestamp
    pub fn validate(&self, channels: usize) -> Result<(), ChunkError> {
        if self.samples.len() != self.timestamps.len() {
            return Err(ChunkError::TimestampMismatch {
                samples: self.samples.len(),
                timestamps: self.timestamps.len(),
            });
        }

        if let Some((index, sample)) = self
            .samples
            .iter()
            .enumerate()
            .find(|(_, sample)| sample.len() != channels)
        {
            return Err(ChunkError::ArityMismatch {
                index,
                expected: channels,
                actual: sample.len(),
            });
        }

        Ok(())
    }
}
