pub mod collector;
pub mod detector;
pub mod error;
pub mod monitor;
pub mod session;
pub mod state;
pub mod worker;

pub use collector::{CollectorConfig, DataCollector, DEFAULT_BUFFER_LIMIT};
pub use detector::TransitionDetector;
pub use error::{CollectorError, MonitorError, SessionError};
pub use monitor::{MonitorConfig, PlaybackMonitor};
pub use session::{EpochOutcome, EpochState, Session, SessionConfig, SessionEvent, SessionEventCallback};
pub use state::LoopState;
pub use worker::{BackgroundLoop, LoopSlot};
