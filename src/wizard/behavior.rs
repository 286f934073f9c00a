//! Manager behaviors and the registry that rehydrates them by type name.
//!
//! A wizard instance stores its `managertype`. Every request resolves that
//! name through [`BehaviorRegistry`] so specialized persistence survives the
//! round trip through the cache instead of falling back to the default.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::records::{RecordStore, WizardRecord};
use crate::wizard::instance::{WizardInstance, DEFAULT_MANAGER_TYPE};
use crate::wizard::{WizardError, WizardResult};

/// Type name of the record-persisting behavior
pub const RECORD_MANAGER_TYPE: &str = "record";

/// Specialization point of a wizard manager
pub trait WizardBehavior: Send + Sync {
    fn type_name(&self) -> &str;

    /// Write the accumulated step data durably.
    ///
    /// Called exactly once when the wizard reaches its terminal state.
    /// Implementations set `instance.recordid` to the persisted record.
    fn persist(&self, _instance: &mut WizardInstance) -> WizardResult<()> {
        Ok(())
    }
}

/// Keeps data in the cache only; persisting is a no-op
pub struct DefaultBehavior;

impl WizardBehavior for DefaultBehavior {
    fn type_name(&self) -> &str {
        DEFAULT_MANAGER_TYPE
    }
}

/// Persists submitted values through a [`RecordStore`]
pub struct RecordBehavior {
    store: Arc<dyn RecordStore>,
}

impl RecordBehavior {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl WizardBehavior for RecordBehavior {
    fn type_name(&self) -> &str {
        RECORD_MANAGER_TYPE
    }

    fn persist(&self, instance: &mut WizardInstance) -> WizardResult<()> {
        let now = chrono::Utc::now().timestamp();
        let data: serde_json::Map<String, Value> = instance
            .submitted_data()
            .into_iter()
            .map(|(step, values)| (step.to_string(), Value::Object(values)))
            .collect();

        let existing = if instance.recordid > 0 {
            self.store
                .get(instance.recordid)
                .map_err(|e| WizardError::Persistence(e.to_string()))?
        } else {
            None
        };

        match existing {
            Some(mut record) => {
                record.data = Value::Object(data);
                record.timemodified = now;
                self.store
                    .update(record)
                    .map_err(|e| WizardError::Persistence(e.to_string()))?;
            }
            None => {
                let record = WizardRecord {
                    id: 0,
                    uniqueid: instance.uniqueid.clone(),
                    data: Value::Object(data),
                    timecreated: now,
                    timemodified: now,
                };
                instance.recordid = self
                    .store
                    .insert(record)
                    .map_err(|e| WizardError::Persistence(e.to_string()))?;
            }
        }
        Ok(())
    }
}

type BehaviorFactory = Arc<dyn Fn() -> Arc<dyn WizardBehavior> + Send + Sync>;

/// Maps manager type names to behavior factories
#[derive(Clone, Default)]
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `default`, plus `record` when a store is given
    pub fn with_defaults(records: Option<Arc<dyn RecordStore>>) -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_MANAGER_TYPE, || Arc::new(DefaultBehavior));
        if let Some(store) = records {
            registry.register(RECORD_MANAGER_TYPE, move || {
                Arc::new(RecordBehavior::new(store.clone()))
            });
        }
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn WizardBehavior> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate the behavior registered under `name`
    pub fn create(&self, name: &str) -> WizardResult<Arc<dyn WizardBehavior>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| WizardError::UnknownManagerType(name.to_string()))
    }
}
