//! JSON-defined step forms

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{value_to_string, FieldDefinition, FieldType, OptionSource};
use super::{FormData, StepForm, ValidationErrors};

/// A form described entirely by its field list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarativeForm {
    pub id: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl DeclarativeForm {
    pub fn new(id: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A value counts as empty when nothing meaningful was submitted
fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_number(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

/// Check a single field value against its definition
fn check_field(field: &FieldDefinition, value: Option<&Value>) -> Option<String> {
    if is_empty_value(value) {
        return field.required.then(|| "Required".to_string());
    }
    let value = value?;

    match field.field_type {
        FieldType::Email => {
            (!is_valid_email(&value_to_string(value))).then(|| "Invalid email address".to_string())
        }
        FieldType::Number => (!is_number(value)).then(|| "Must be a number".to_string()),
        FieldType::Duration | FieldType::DateTime => {
            (!is_integer(value)).then(|| "Must be a whole number".to_string())
        }
        FieldType::Checkbox | FieldType::Advcheckbox => {
            let checked = value_to_string(value) == "1";
            (field.required && !checked).then(|| "Required".to_string())
        }
        FieldType::Select | FieldType::Autocomplete => {
            let options = field.options().unwrap_or_default();
            if options.is_empty() {
                return None;
            }
            let selected: Vec<String> = match value {
                Value::Array(items) => items.iter().map(value_to_string).collect(),
                other => vec![value_to_string(other)],
            };
            if selected.len() > 1 && !field.multiple {
                return Some("Only one option may be selected".to_string());
            }
            selected
                .iter()
                .any(|v| !options.contains_key(v))
                .then(|| "Invalid selection".to_string())
        }
        FieldType::Text | FieldType::Textarea | FieldType::Hidden => None,
    }
}

impl StepForm for DeclarativeForm {
    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self, data: &FormData) -> Vec<FieldDefinition> {
        self.fields.iter().map(|f| f.resolved(data)).collect()
    }

    fn validate(&self, values: &FormData) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in self.fields(values) {
            if let Some(message) = check_field(&field, values.get(&field.name)) {
                errors.add(field.name.clone(), message);
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FieldOption;
    use serde_json::json;

    fn contact_form() -> DeclarativeForm {
        DeclarativeForm::new(
            "contact",
            vec![
                FieldDefinition::new("name", "Name", FieldType::Text).required(),
                FieldDefinition::new("email", "Email", FieldType::Email).required(),
                FieldDefinition::new("age", "Age", FieldType::Number),
                FieldDefinition::new("color", "Color", FieldType::Select).with_options(vec![
                    FieldOption::new("r", "Red"),
                    FieldOption::new("g", "Green"),
                ]),
            ],
        )
    }

    fn data(value: Value) -> FormData {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_submission() {
        let form = contact_form();
        let values = data(json!({"name": "Ada", "email": "ada@example.org", "age": "36", "color": "g"}));
        assert!(form.validate(&values).is_ok());
    }

    #[test]
    fn test_required_fields() {
        let form = contact_form();
        let errors = form.validate(&data(json!({"name": "  "}))).unwrap_err();
        assert_eq!(errors.get("name"), Some("Required"));
        assert_eq!(errors.get("email"), Some("Required"));
        assert!(errors.get("age").is_none());
    }

    #[test]
    fn test_type_checks() {
        let form = contact_form();
        let errors = form
            .validate(&data(json!({
                "name": "Ada",
                "email": "not-an-email",
                "age": "old",
                "color": "blue"
            })))
            .unwrap_err();
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(errors.get("age"), Some("Must be a number"));
        assert_eq!(errors.get("color"), Some("Invalid selection"));
    }

    #[test]
    fn test_single_select_rejects_multiple_values() {
        let form = contact_form();
        let errors = form
            .validate(&data(json!({"name": "Ada", "email": "a@b.co", "color": ["r", "g"]})))
            .unwrap_err();
        assert_eq!(errors.get("color"), Some("Only one option may be selected"));
    }

    #[test]
    fn test_required_checkbox_must_be_checked() {
        let form = DeclarativeForm::new(
            "terms",
            vec![FieldDefinition::new("agree", "I agree", FieldType::Advcheckbox).required()],
        );
        assert!(form.validate(&data(json!({"agree": "0"}))).is_err());
        assert!(form.validate(&data(json!({"agree": "1"}))).is_ok());
        assert!(form.validate(&data(json!({"agree": true}))).is_ok());
    }

    #[test]
    fn test_email_check() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("ab.co"));
    }
}
