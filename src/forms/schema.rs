//! Field definitions shared by step forms, label formatting and rendering

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field types understood by the wizard
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text input
    Text,
    /// Multi-line text input
    Textarea,
    /// Email address
    Email,
    /// Numeric input
    Number,
    /// Hidden bookkeeping value, never shown on the review page
    Hidden,
    /// Selection from predefined options
    Select,
    /// Searchable selection, enhanced client-side
    Autocomplete,
    /// Checkbox that only submits when checked
    Checkbox,
    /// Checkbox that always submits a checked or unchecked value
    Advcheckbox,
    /// Length of time in seconds
    Duration,
    /// Unix timestamp
    DateTime,
}

impl FieldType {
    /// Types that carry an option set mapping raw values to labels
    pub fn carries_options(self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Autocomplete | FieldType::Checkbox | FieldType::Advcheckbox
        )
    }

    pub fn is_checkbox(self) -> bool {
        matches!(self, FieldType::Checkbox | FieldType::Advcheckbox)
    }
}

/// One selectable option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Options that depend on the current value of another field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependentOptions {
    /// Field whose value selects the option set
    pub field: String,
    /// Option sets keyed by the controlling field's value
    pub sets: IndexMap<String, Vec<FieldOption>>,
}

/// Schema definition for a single form field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    /// Field identifier, the key in submitted values
    pub name: String,
    /// Human-readable label
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Static options for option-bearing types
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Options recomputed from another field's value
    #[serde(default)]
    pub options_by: Option<DependentOptions>,
    /// Whether several options may be selected
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub help: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
            options_by: None,
            multiple: false,
            help: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.field_type == FieldType::Hidden
    }

    /// Resolve dependent options against the given values, replacing the
    /// static option list when the controlling field selects a set
    pub fn resolved(&self, values: &serde_json::Map<String, Value>) -> FieldDefinition {
        let mut field = self.clone();
        if let Some(dependent) = &self.options_by {
            let key = values.get(&dependent.field).map(value_to_string);
            field.options = key
                .and_then(|k| dependent.sets.get(&k).cloned())
                .unwrap_or_default();
        }
        field
    }
}

/// Capability exposed by every option-bearing field: raw value to label
pub trait OptionSource {
    fn options(&self) -> Option<IndexMap<String, String>>;
}

impl OptionSource for FieldDefinition {
    fn options(&self) -> Option<IndexMap<String, String>> {
        if !self.field_type.carries_options() {
            return None;
        }

        if self.field_type.is_checkbox() && self.options.is_empty() {
            let mut defaults = IndexMap::new();
            defaults.insert("1".to_string(), "Yes".to_string());
            defaults.insert("0".to_string(), "No".to_string());
            return Some(defaults);
        }

        Some(
            self.options
                .iter()
                .map(|o| (o.value.clone(), o.label.clone()))
                .collect(),
        )
    }
}

/// Render a scalar JSON value as the string a form would submit
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        other => other.to_string(),
    }
}
