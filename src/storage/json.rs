use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use serde::Deserialize;
use crate::core::DataFrame;
use super::RecordStore;

/// Stores each epoch record as a pretty-printed JSON file named after its id
pub struct JsonRecordStore {
    storage_dir: PathBuf,
}

impl JsonRecordStore {
    /// Create the store, creating its directory if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        fs::create_dir_all(&storage_dir)
            .context("Failed to create session data directory")?;

        Ok(Self { storage_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn load(&self, record_id: &str) -> Result<DataFrame> {
        let path = self.record_path(record_id);
        let json = fs::read_to_string(&path)
            .context(format!("Failed to read record from {:?}", path))?;

        let frame: DataFrame = serde_json::from_str(&json)
            .context("Failed to deserialize epoch record")?;

        Ok(frame)
    }

    pub fn delete(&self, record_id: &str) -> Result<()> {
        let path = self.record_path(record_id);
        if path.exists() {
            fs::remove_file(&path)
                .context(format!("Failed to delete record at {:?}", path))?;
        }
        Ok(())
    }

    /// Ids of all stored records, oldest first
    pub fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        // ids are timestamps, so lexical order is chronological
        ids.sort();
        Ok(ids)
    }

    /// Number of stored records per label; unlabeled records count under `None`
    pub fn label_counts(&self) -> Result<BTreeMap<Option<String>, usize>> {
        #[derive(Deserialize)]
        struct LabelOnly {
            label: Option<String>,
        }

        let mut counts = BTreeMap::new();
        for id in self.list_ids()? {
            let path = self.record_path(&id);
            let json = fs::read_to_string(&path)
                .context(format!("Failed to read record from {:?}", path))?;
            let record: LabelOnly = serde_json::from_str(&json)
                .context(format!("Failed to read label of {:?}", path))?;

            *counts.entry(record.label).or_insert(0) += 1;
        }

        Ok(counts)
    }

    fn record_path(&self, record_id: &str) -> PathBuf {
        self.storage_dir.join(format!("{}.json", record_id))
    }
}

impl RecordStore for JsonRecordStore {
    fn persist(&self, record_id: &str, frame: &DataFrame) -> Result<()> {
        let path = self.record_path(record_id);
        let json = serde_json::to_string_pretty(frame)
            .context("Failed to serialize epoch record")?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)
            .context(format!("Failed to write record to {:?}", temp_path))?;

        fs::rename(&temp_path, &path)
            .context(format!("Failed to move record into place at {:?}", path))?;

        log::debug!("Persisted epoch record {:?}", path);
        Ok(())
    }
}
