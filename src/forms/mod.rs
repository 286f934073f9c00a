//! Step forms: field schemas, validation and the form registry.
//!
//! The wizard treats a form as a capability. It receives bound data, reports
//! its field schema, validates submitted values and renders itself to
//! markup. [`DeclarativeForm`] is the built-in implementation driven by JSON
//! field definitions; embedding applications can register their own
//! [`StepForm`] implementations.

pub mod declarative;
pub mod schema;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::templates::TemplateRenderer;
use crate::wizard::{WizardError, WizardResult};

pub use declarative::DeclarativeForm;
pub use schema::{FieldDefinition, FieldOption, FieldType, OptionSource};

/// Values bound to or submitted from a form
pub type FormData = serde_json::Map<String, serde_json::Value>;

/// Field name to validation message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors(pub BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// A form page bound into a wizard step
pub trait StepForm: Send + Sync {
    /// Identifier referenced by a step's `formclass`
    fn id(&self) -> &str;

    /// Field schema for the given bound data
    fn fields(&self, data: &FormData) -> Vec<FieldDefinition>;

    /// Hook run before rendering; returns the values the form displays
    fn set_data(&self, data: &FormData) -> FormData {
        data.clone()
    }

    /// Validate submitted values
    fn validate(&self, values: &FormData) -> Result<(), ValidationErrors>;

    /// Render the form to markup
    fn render(&self, data: &FormData, renderer: &TemplateRenderer) -> WizardResult<String> {
        let fields = self.fields(data);
        renderer.render_form(self.id(), &fields, data, None)
    }
}

/// Built-in demo forms, embedded at compile time
static BUILTIN_FORMS: Lazy<Vec<DeclarativeForm>> = Lazy::new(|| {
    [
        include_str!("builtin/demo_contact.json"),
        include_str!("builtin/demo_preferences.json"),
        include_str!("builtin/demo_confirm.json"),
    ]
    .iter()
    .filter_map(|raw| match DeclarativeForm::from_json(raw) {
        Ok(form) => Some(form),
        Err(e) => {
            tracing::warn!("Skipping invalid builtin form: {}", e);
            None
        }
    })
    .collect()
});

/// Registry of step forms keyed by form class id
#[derive(Clone, Default)]
pub struct FormRegistry {
    forms: HashMap<String, Arc<dyn StepForm>>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in demo forms
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for form in BUILTIN_FORMS.iter() {
            registry.register(Arc::new(form.clone()));
        }
        registry
    }

    /// Register a form, replacing any form with the same id
    pub fn register(&mut self, form: Arc<dyn StepForm>) {
        self.forms.insert(form.id().to_string(), form);
    }

    pub fn get(&self, id: &str) -> WizardResult<Arc<dyn StepForm>> {
        self.forms
            .get(id)
            .cloned()
            .ok_or_else(|| WizardError::UnknownForm(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.forms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Load every `*.json` declarative form in `dir`.
    /// A missing directory is not an error.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut loaded = 0;
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read forms directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read form {}", path.display()))?;
            let form = DeclarativeForm::from_json(&raw)
                .with_context(|| format!("Invalid form definition {}", path.display()))?;
            tracing::debug!(form = %form.id, path = %path.display(), "Loaded form");
            self.register(Arc::new(form));
            loaded += 1;
        }
        Ok(loaded)
    }
}
