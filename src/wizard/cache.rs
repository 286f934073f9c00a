//! Ephemeral per-instance storage for wizard configuration and step data.
//!
//! Entries are keyed by `(uniqueid, recordid)`. Step writes are a
//! read-modify-write over the whole entry without any lock held between the
//! read and the write, so two concurrent submissions to the same instance
//! race and the last write wins. That is acceptable for one user filling in
//! one wizard; editing the same instance from several tabs or devices is not
//! guarded.
//!
//! The terminal transition has the same gap: two confirm requests for one
//! instance can both load the entry before either purges it, and each then
//! persists. With the `record` manager type that inserts two records. A
//! single controller never sends them concurrently since it ignores clicks
//! while a request is outstanding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::forms::FormData;
use crate::wizard::instance::WizardInstance;
use crate::wizard::{WizardError, WizardResult};

/// Raw keyed store backing the step cache
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    fn delete(&self, key: &str);
}

/// Process-local cache store
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

/// Typed access to wizard cache entries
#[derive(Clone)]
pub struct StepCache {
    store: Arc<dyn CacheStore>,
}

impl StepCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()))
    }

    /// Cache key for an instance
    pub fn key(uniqueid: &str, recordid: i64) -> String {
        format!("multistepform_{}_{}", uniqueid, recordid)
    }

    pub fn exists(&self, uniqueid: &str, recordid: i64) -> bool {
        self.store.get(&Self::key(uniqueid, recordid)).is_some()
    }

    /// Cached configuration, `None` when no entry exists
    pub fn get(&self, uniqueid: &str, recordid: i64) -> WizardResult<Option<WizardInstance>> {
        match self.store.get(&Self::key(uniqueid, recordid)) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set(&self, uniqueid: &str, recordid: i64, instance: &WizardInstance) -> WizardResult<()> {
        let value = serde_json::to_value(instance)?;
        self.store.set(&Self::key(uniqueid, recordid), value);
        Ok(())
    }

    pub fn purge(&self, uniqueid: &str, recordid: i64) {
        self.store.delete(&Self::key(uniqueid, recordid));
    }

    /// Stored data of one step, empty when the entry or the step is missing
    pub fn get_step_data(&self, uniqueid: &str, recordid: i64, step: u32) -> FormData {
        self.store
            .get(&Self::key(uniqueid, recordid))
            .and_then(|entry| entry.get("steps")?.get(step.to_string())?.as_object().cloned())
            .unwrap_or_default()
    }

    /// Merge `data` into the nested `steps[step]` object of an existing entry
    pub fn set_step_data(
        &self,
        uniqueid: &str,
        recordid: i64,
        step: u32,
        data: FormData,
    ) -> WizardResult<()> {
        let key = Self::key(uniqueid, recordid);
        let mut entry = self
            .store
            .get(&key)
            .ok_or_else(|| WizardError::invalid_instance(uniqueid, recordid))?;

        let steps = entry
            .as_object_mut()
            .ok_or_else(|| WizardError::Cache(format!("entry '{}' is not an object", key)))?
            .entry("steps")
            .or_insert_with(|| Value::Object(FormData::new()));
        let steps = steps
            .as_object_mut()
            .ok_or_else(|| WizardError::Cache(format!("entry '{}' has malformed steps", key)))?;

        let slot = steps
            .entry(step.to_string())
            .or_insert_with(|| Value::Object(FormData::new()));
        match slot.as_object_mut() {
            Some(existing) => existing.extend(data),
            None => *slot = Value::Object(data),
        }

        self.store.set(&key, entry);
        Ok(())
    }
}
