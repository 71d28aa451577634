use std::collections::BTreeMap;
use anyhow::Result;
use parking_lot::Mutex;
use crate::core::DataFrame;
use super::RecordStore;

/// In-memory record store with injectable write failures
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, DataFrame>>,
    fail_next: Mutex<u32>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail
    pub fn fail_next(&self, count: u32) {
        *self.fail_next.lock() = count;
    }

    pub fn get(&self, record_id: &str) -> Option<DataFrame> {
        self.records.lock().get(record_id).cloned()
    }

    /// All records ordered by id
    pub fn records(&self) -> Vec<(String, DataFrame)> {
        self.records
            .lock()
            .iter()
            .map(|(id, frame)| (id.clone(), frame.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn persist(&self, record_id: &str, frame: &DataFrame) -> Result<()> {
        {
            let mut fail_next = self.fail_next.lock();
            if *fail_next > 0 {
                *fail_next -= 1;
                anyhow::bail!("injected write failure for {}", record_id);
            }
        }

        self.records.lock().insert(record_id.to_string(), frame.clone());
        Ok(())
    }
}
