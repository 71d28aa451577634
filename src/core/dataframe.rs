use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::{EpochMarkers, PlaybackInfo, Sample};

/// Record of one completed epoch: a playback item paired with the signal
/// collected while it played
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    /// Subject the data was collected for
    pub userid: String,

    /// Item that was playing during the epoch
    pub playback: PlaybackInfo,

    /// Label assigned by the subject, if any
    pub label: Option<String>,

    /// Epoch start, end and labeling times
    pub markers: EpochMarkers,

    /// Drained buffer contents, oldest first
    pub eeg: Vec<Sample>,

    /// Source timestamps of the drained samples
    pub timestamps: Vec<f64>,
}

impl DataFrame {
    pub fn new(
        userid: impl Into<String>,
        playback: PlaybackInfo,
        label: Option<String>,
        markers: EpochMarkers,
        eeg: Vec<Sample>,
        timestamps: Vec<f64>,
    ) -> Self {
        Self {
            userid: userid.into(),
            playback,
            label,
            markers,
            eeg,
            timestamps,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.eeg.len()
    }
}

/// Record identifier derived from a rollover timestamp, safe to use as a file name
pub fn record_id(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H-%M-%S%.6fZ").to_string()
}
