pub mod eeg;
pub mod playback;

pub use eeg::SimulatedEegStream;
pub use playback::{ScriptHandle, ScriptedPlaybackSource};
