pub mod json;
pub mod memory;

pub use json::JsonRecordStore;
pub use memory::MemoryRecordStore;

use crate::core::DataFrame;
use anyhow::Result;

/// Destination for closed epoch records
pub trait RecordStore: Send + Sync {
    /// Write `frame` under `record_id`, replacing any record with that id
    fn persist(&self, record_id: &str, frame: &DataFrame) -> Result<()>;
}
