use crate::core::{Sample, SampleChunk};
use crate::hal::{SampleStream, StreamError, StreamInfo};
use async_trait::async_trait;
use std::f64::consts::PI;
use tokio::time::{sleep, Duration, Instant};

/// Sine components assigned to channels round-robin
const CHANNEL_FREQUENCIES: [f64; 5] = [5.0, 10.0, 15.0, 20.0, 60.0];

/// Stream that synthesizes sine-wave EEG at the nominal rate.
///
/// Every pull returns the samples that became due since the previous pull,
/// timestamped in seconds since the stream was created.
pub struct SimulatedEegStream {
    info: StreamInfo,
    amplitude: f64,
    chunk_interval: Duration,
    origin: Instant,
    emitted: u64,
}

impl SimulatedEegStream {
    pub fn new() -> Self {
        Self::with_info(StreamInfo::default())
    }

    pub fn with_info(info: StreamInfo) -> Self {
        Self {
            info,
            amplitude: 1.0,
            chunk_interval: Duration::from_millis(50),
            origin: Instant::now(),
            emitted: 0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// How long a pull waits for data to accumulate (capped by the pull timeout)
    pub fn with_chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = interval;
        self
    }

    fn sample_at(&self, t: f64) -> Sample {
        (0..self.info.channel_count())
            .map(|channel| {
                let freq = CHANNEL_FREQUENCIES[channel % CHANNEL_FREQUENCIES.len()];
                self.amplitude * (2.0 * PI * freq * t).sin()
            })
            .collect()
    }
}

impl Default for SimulatedEegStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SampleStream for SimulatedEegStream {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    async fn pull_chunk(&mut self, timeout: Duration) -> Result<SampleChunk, StreamError> {
        if self.info.sampling_rate <= 0.0 {
            return Err(StreamError::Read("sampling rate must be positive".to_string()));
        }

        sleep(self.chunk_interval.min(timeout)).await;

        let rate = self.info.sampling_rate;
        let elapsed = self.origin.elapsed().as_secs_f64();
        let due = (elapsed * rate) as u64;
        let count = due.saturating_sub(self.emitted);

        let mut chunk = SampleChunk::empty();
        for n in self.emitted..self.emitted + count {
            let t = n as f64 / rate;
            chunk.samples.push(self.sample_at(t));
            chunk.timestamps.push(t);
        }
        self.emitted += count;

        Ok(chunk)
    }
}
