use crate::core::{ChunkError, Sample, SampleChunk};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Maximum number of samples a buffer retains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferBound {
    /// Keep only the newest `n` samples and timestamps
    Bounded(NonZeroUsize),

    /// Grow without limit; memory use is proportional to epoch length
    Unbounded,
}

impl BufferBound {
    /// Bound of `n` samples; `0` is rejected
    pub fn bounded(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(Self::Bounded)
    }

    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Bounded(n) => Some(n.get()),
            Self::Unbounded => None,
        }
    }
}

/// Append-and-trim store for samples and their timestamps.
///
/// Not synchronized on its own; `DataCollector` wraps it in a mutex.
/// After `clear()` the buffer holds a single all-zero placeholder sample and
/// no timestamps.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    channels: usize,
    bound: BufferBound,
    samples: VecDeque<Sample>,
    timestamps: VecDeque<f64>,
    trimmed: u64,
}

impl SampleBuffer {
    pub fn new(channels: usize, bound: BufferBound) -> Self {
        let mut buffer = Self {
            channels,
            bound,
            samples: VecDeque::new(),
            timestamps: VecDeque::new(),
            trimmed: 0,
        };
        buffer.clear();
        buffer
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.timestamps.clear();
        self.samples.push_back(vec![0.0; self.channels]);
    }

    /// Validate and append a chunk, then trim to the bound.
    ///
    /// A chunk that fails validation is rejected as a whole and the buffer is
    /// left untouched. Returns the number of samples appended.
    pub fn append(&mut self, chunk: SampleChunk) -> Result<usize, ChunkError> {
        chunk.validate(self.channels)?;

        let appended = chunk.len();
        self.samples.extend(chunk.samples);
        self.timestamps.extend(chunk.timestamps);
        self.trim();

        Ok(appended)
    }

    fn trim(&mut self) {
        if let Some(limit) = self.bound.limit() {
            let excess = self.samples.len().saturating_sub(limit);
            self.samples.drain(..excess);
            self.trimmed += excess as u64;

            let excess = self.timestamps.len().saturating_sub(limit);
            self.timestamps.drain(..excess);
        }
    }

    /// Copy of the buffered samples, oldest first
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    /// Copy of the buffered timestamps, oldest first
    pub fn timestamps(&self) -> Vec<f64> {
        self.timestamps.iter().copied().collect()
    }

    /// Move the contents out and leave the buffer cleared
    pub fn take(&mut self) -> (Vec<Sample>, Vec<f64>) {
        let samples: Vec<Sample> = std::mem::take(&mut self.samples).into();
        let timestamps: Vec<f64> = std::mem::take(&mut self.timestamps).into();
        self.clear();
        (samples, timestamps)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn bound(&self) -> BufferBound {
        self.bound
    }

    /// Samples discarded by trimming since construction
    pub fn trimmed(&self) -> u64 {
        self.trimmed
    }
}
