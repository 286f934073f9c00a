//! Durable record storage for completed wizards.
//!
//! A small get/insert/update-by-id capability. The wizard core only reaches
//! it through the `record` manager behavior.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors from record stores
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record {0} not found")]
    NotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persisted wizard submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WizardRecord {
    /// 0 until inserted
    pub id: i64,
    pub uniqueid: String,
    /// Submitted values keyed by step number
    pub data: Value,
    pub timecreated: i64,
    pub timemodified: i64,
}

pub trait RecordStore: Send + Sync {
    fn get(&self, id: i64) -> Result<Option<WizardRecord>, RecordError>;

    /// Insert a new record and return its id
    fn insert(&self, record: WizardRecord) -> Result<i64, RecordError>;

    /// Replace an existing record
    fn update(&self, record: WizardRecord) -> Result<(), RecordError>;
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<i64, WizardRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: i64) -> Result<Option<WizardRecord>, RecordError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(&id).cloned())
    }

    fn insert(&self, mut record: WizardRecord) -> Result<i64, RecordError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let id = records.keys().next_back().copied().unwrap_or(0) + 1;
        record.id = id;
        records.insert(id, record);
        Ok(id)
    }

    fn update(&self, record: WizardRecord) -> Result<(), RecordError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RecordError::NotFound(record.id)),
        }
    }
}

/// Stores each record as `<id>.json` in a directory
pub struct JsonFileRecordStore {
    dir: PathBuf,
    // Serializes id allocation within this process
    lock: Mutex<()>,
}

impl JsonFileRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: i64) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn max_id(&self) -> Result<i64, RecordError> {
        let mut max = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<i64>().ok())
            {
                max = max.max(id);
            }
        }
        Ok(max)
    }

    fn write(&self, record: &WizardRecord) -> Result<(), RecordError> {
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(self.record_path(record.id), json)?;
        Ok(())
    }
}

impl RecordStore for JsonFileRecordStore {
    fn get(&self, id: i64) -> Result<Option<WizardRecord>, RecordError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn insert(&self, mut record: WizardRecord) -> Result<i64, RecordError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        record.id = self.max_id()? + 1;
        self.write(&record)?;
        Ok(record.id)
    }

    fn update(&self, record: WizardRecord) -> Result<(), RecordError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if !self.record_path(record.id).exists() {
            return Err(RecordError::NotFound(record.id));
        }
        self.write(&record)
    }
}
