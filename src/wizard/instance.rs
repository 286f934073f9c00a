//! Wizard instance configuration and step definitions

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::forms::FormData;
use crate::wizard::{WizardError, WizardResult};

/// Manager type used when none is given
pub const DEFAULT_MANAGER_TYPE: &str = "default";

fn default_manager_type() -> String {
    DEFAULT_MANAGER_TYPE.to_string()
}

/// One page of a wizard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    /// Form class id resolved through the form registry
    #[serde(rename = "formclass")]
    pub form_class: String,
    pub label: String,
    #[serde(rename = "stepidentifier", default)]
    pub step_identifier: String,
    /// Pre-filled values
    #[serde(rename = "formdata", default)]
    pub form_data: FormData,
    /// Raw values from the last successful submission of this step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted: Option<FormData>,
    /// Field label → display value, only used by the review page
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,
}

impl StepDefinition {
    pub fn new(form_class: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            form_class: form_class.into(),
            label: label.into(),
            step_identifier: String::new(),
            form_data: FormData::new(),
            submitted: None,
            labels: IndexMap::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.step_identifier = identifier.into();
        self
    }

    pub fn with_form_data(mut self, form_data: FormData) -> Self {
        self.form_data = form_data;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.submitted.is_some()
    }
}

/// Configuration and accumulated state of one wizard run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WizardInstance {
    pub uniqueid: String,
    /// 0 until a durable record exists
    #[serde(default)]
    pub recordid: i64,
    /// Dense 1-based step numbering
    pub steps: BTreeMap<u32, StepDefinition>,
    /// Whether completed steps may be revisited
    #[serde(rename = "canmovesteps", default)]
    pub can_move_steps: bool,
    /// Whether a review page precedes the final submit
    #[serde(rename = "hasreview", default)]
    pub has_review: bool,
    #[serde(rename = "returnurl", default)]
    pub return_url: String,
    /// Template id, empty means the configured default
    #[serde(rename = "template", default)]
    pub template_id: String,
    /// Behavior registry key used to rehydrate specialized managers
    #[serde(rename = "managertype", default = "default_manager_type")]
    pub manager_type: String,
    #[serde(rename = "initialstep", default, skip_serializing_if = "Option::is_none")]
    pub initial_step: Option<u32>,
}

impl WizardInstance {
    /// Create an instance from an ordered list of steps, numbered from 1
    pub fn new(uniqueid: impl Into<String>, steps: Vec<StepDefinition>) -> Self {
        Self {
            uniqueid: uniqueid.into(),
            recordid: 0,
            steps: (1..).zip(steps).collect(),
            can_move_steps: false,
            has_review: false,
            return_url: String::new(),
            template_id: String::new(),
            manager_type: default_manager_type(),
            initial_step: None,
        }
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn step(&self, number: u32) -> Option<&StepDefinition> {
        self.steps.get(&number)
    }

    /// First step to render
    pub fn first_step(&self) -> u32 {
        self.initial_step.unwrap_or(1)
    }

    /// Submitted values of every completed step, in step order
    pub fn submitted_data(&self) -> BTreeMap<u32, FormData> {
        self.steps
            .iter()
            .filter_map(|(n, s)| s.submitted.clone().map(|data| (*n, data)))
            .collect()
    }

    /// Check the structural invariants of the configuration
    pub fn validate(&self) -> WizardResult<()> {
        if self.uniqueid.trim().is_empty() {
            return Err(WizardError::InvalidConfiguration(
                "uniqueid must not be empty".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(WizardError::InvalidConfiguration(
                "a wizard needs at least one step".to_string(),
            ));
        }
        for (expected, (number, step)) in (1u32..).zip(&self.steps) {
            if *number != expected {
                return Err(WizardError::InvalidConfiguration(format!(
                    "step numbers must be dense from 1, found {} where {} was expected",
                    number, expected
                )));
            }
            if step.form_class.trim().is_empty() {
                return Err(WizardError::InvalidConfiguration(format!(
                    "step {} has no formclass",
                    number
                )));
            }
        }
        if let Some(initial) = self.initial_step {
            if self.step(initial).is_none() {
                return Err(WizardError::InvalidConfiguration(format!(
                    "initial step {} is out of range",
                    initial
                )));
            }
        }
        Ok(())
    }
}
