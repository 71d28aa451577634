pub mod mock;
pub mod traits;
pub mod types;

pub use traits::{PlaybackSource, SampleStream};
pub use types::{SourceError, StreamError, StreamInfo};
