pub mod sample_buffer;

pub use sample_buffer::{BufferBound, SampleBuffer};
