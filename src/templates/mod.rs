//! Handlebars rendering of wizard pages and step forms.
//!
//! The wizard page (`multistepform`) and the generic form markup (`form`)
//! are embedded; additional or overriding `*.hbs` templates can be loaded
//! from a directory at startup.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

use crate::forms::schema::value_to_string;
use crate::forms::{FieldDefinition, FieldType, FormData, ValidationErrors};
use crate::wizard::{WizardError, WizardResult};

/// Template id of the wizard page
pub const WIZARD_TEMPLATE: &str = "multistepform";
/// Template id of the generic form markup
pub const FORM_TEMPLATE: &str = "form";

/// Bookkeeping values posted back with every form as hidden inputs
const HIDDEN_BOOKKEEPING: &[&str] = &["uniqueid", "recordid", "step"];

#[derive(Serialize)]
struct OptionContext {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Serialize)]
struct FieldContext {
    name: String,
    label: String,
    required: bool,
    help: Option<String>,
    error: Option<String>,
    value: String,
    input_type: &'static str,
    is_hidden: bool,
    is_textarea: bool,
    is_select: bool,
    is_checkbox: bool,
    is_input: bool,
    multiple: bool,
    enhance: bool,
    checked: bool,
    options: Vec<OptionContext>,
}

#[derive(Serialize)]
struct HiddenContext {
    name: String,
    value: String,
}

fn selected_values(value: Option<&Value>) -> HashSet<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
        Some(Value::Null) | None => HashSet::new(),
        Some(other) => std::iter::once(value_to_string(other)).collect(),
    }
}

fn field_context(field: &FieldDefinition, values: &FormData, errors: Option<&ValidationErrors>) -> FieldContext {
    let value = values.get(&field.name);
    let selected = selected_values(value);
    let field_type = field.field_type;
    let is_select = matches!(field_type, FieldType::Select | FieldType::Autocomplete);
    let is_checkbox = field_type.is_checkbox();
    let is_textarea = field_type == FieldType::Textarea;
    let is_hidden = field_type == FieldType::Hidden;

    FieldContext {
        name: field.name.clone(),
        label: field.label.clone(),
        required: field.required,
        help: field.help.clone(),
        error: errors.and_then(|e| e.get(&field.name)).map(str::to_string),
        value: match value {
            Some(Value::Array(_)) | None => String::new(),
            Some(v) => value_to_string(v),
        },
        input_type: match field_type {
            FieldType::Email => "email",
            FieldType::Number | FieldType::Duration | FieldType::DateTime => "number",
            _ => "text",
        },
        is_hidden,
        is_textarea,
        is_select,
        is_checkbox,
        is_input: !(is_hidden || is_textarea || is_select || is_checkbox),
        multiple: field.multiple,
        enhance: field_type == FieldType::Autocomplete,
        checked: selected.contains("1"),
        options: field
            .options
            .iter()
            .map(|o| OptionContext {
                value: o.value.clone(),
                label: o.label.clone(),
                selected: selected.contains(&o.value),
            })
            .collect(),
    }
}

/// Renders templates by id
pub struct TemplateRenderer {
    hbs: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Renderer with the embedded templates registered
    pub fn new() -> WizardResult<Self> {
        let mut renderer = Self {
            hbs: Handlebars::new(),
        };
        renderer.hbs.set_strict_mode(false);
        renderer.register_template(WIZARD_TEMPLATE, include_str!("multistepform.hbs"))?;
        renderer.register_template(FORM_TEMPLATE, include_str!("form.hbs"))?;
        Ok(renderer)
    }

    pub fn register_template(&mut self, name: &str, source: &str) -> WizardResult<()> {
        self.hbs
            .register_template_string(name, source)
            .map_err(|e| WizardError::Render(format!("template '{}': {}", name, e)))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.hbs.has_template(name)
    }

    /// Register every `*.hbs` file in `dir` under its file stem.
    /// A missing directory is not an error.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read templates directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("hbs") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            self.register_template(&name, &source)?;
            tracing::debug!(template = %name, "Loaded template");
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Render a registered template with JSON data
    pub fn render(&self, template_id: &str, data: &Value) -> WizardResult<String> {
        if !self.hbs.has_template(template_id) {
            return Err(WizardError::Render(format!(
                "template '{}' is not registered",
                template_id
            )));
        }
        Ok(self.hbs.render(template_id, data)?)
    }

    /// Render a form's fields with the given values and optional errors
    pub fn render_form(
        &self,
        form_class: &str,
        fields: &[FieldDefinition],
        values: &FormData,
        errors: Option<&ValidationErrors>,
    ) -> WizardResult<String> {
        let hidden: Vec<HiddenContext> = HIDDEN_BOOKKEEPING
            .iter()
            .filter_map(|name| {
                values.get(*name).map(|v| HiddenContext {
                    name: (*name).to_string(),
                    value: value_to_string(v),
                })
            })
            .collect();
        let fields: Vec<FieldContext> = fields
            .iter()
            .filter(|f| !HIDDEN_BOOKKEEPING.contains(&f.name.as_str()))
            .map(|f| field_context(f, values, errors))
            .collect();

        let data = serde_json::json!({
            "formclass": form_class,
            "hidden": hidden,
            "fields": fields,
        });
        self.render(FORM_TEMPLATE, &data)
    }
}
