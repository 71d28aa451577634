pub mod dataframe;
pub mod markers;
pub mod playback;
pub mod sample;

pub use dataframe::{record_id, DataFrame};
pub use markers::EpochMarkers;
pub use playback::{PlaybackInfo, PlaybackSnapshot, Transition, TransitionEvent};
pub use sample::{ChunkError, Sample, SampleChunk};
