pub mod labeler;
pub mod sink;

pub use labeler::{LabelError, PlaylistLabeler, PlaylistRef};
pub use sink::{PlaylistSink, RecordingPlaylistSink, SinkError};
