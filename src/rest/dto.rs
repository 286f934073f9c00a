//! Data Transfer Objects for the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::forms::FormData;
use crate::wizard::instance::DEFAULT_MANAGER_TYPE;
use crate::wizard::{StepDefinition, StepOutput, WizardInstance};

// =============================================================================
// Wizard DTOs
// =============================================================================

/// One step of a wizard to construct
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StepDefinitionRequest {
    /// Registered form class id
    pub formclass: String,
    pub label: String,
    #[serde(default)]
    pub stepidentifier: String,
    /// Pre-filled values
    #[serde(default)]
    #[schema(value_type = Object)]
    pub formdata: FormData,
}

/// Request to construct (or resume) a wizard instance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWizardRequest {
    pub uniqueid: String,
    #[serde(default)]
    pub recordid: i64,
    pub steps: Vec<StepDefinitionRequest>,
    #[serde(default)]
    pub canmovesteps: bool,
    #[serde(default)]
    pub hasreview: bool,
    #[serde(default)]
    pub returnurl: String,
    /// Template id, defaults to the configured wizard template
    #[serde(default)]
    pub template: String,
    /// Manager type, defaults to "default"
    #[serde(default)]
    pub managertype: Option<String>,
    #[serde(default)]
    pub initialstep: Option<u32>,
}

impl CreateWizardRequest {
    pub fn into_instance(self) -> WizardInstance {
        let steps = self
            .steps
            .into_iter()
            .map(|s| {
                StepDefinition::new(s.formclass, s.label)
                    .with_identifier(s.stepidentifier)
                    .with_form_data(s.formdata)
            })
            .collect();

        let mut instance = WizardInstance::new(self.uniqueid, steps);
        instance.recordid = self.recordid;
        instance.can_move_steps = self.canmovesteps;
        instance.has_review = self.hasreview;
        instance.return_url = self.returnurl;
        instance.template_id = self.template;
        instance.manager_type = self
            .managertype
            .unwrap_or_else(|| DEFAULT_MANAGER_TYPE.to_string());
        instance.initial_step = self.initialstep;
        instance
    }
}

/// Rendered step returned by load_step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoadStepResponse {
    /// Wire step number (-1 review, -3 confirmed terminal)
    pub step: i64,
    pub formclass: String,
    /// Template context encoded as a JSON string
    pub data: String,
    pub template: String,
    /// Non-empty once the wizard is complete; the client navigates there
    #[serde(default)]
    pub returnurl: String,
}

impl From<StepOutput> for LoadStepResponse {
    fn from(output: StepOutput) -> Self {
        Self {
            step: output.step,
            formclass: output.form_class,
            data: output.data.to_string(),
            template: output.template,
            returnurl: output.return_url,
        }
    }
}

/// Values posted from a step form
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StepValuesRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub values: FormData,
}

/// Acknowledgement of a saved step
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitStepResponse {
    pub step: i64,
    pub saved: bool,
}

// =============================================================================
// Health DTOs
// =============================================================================

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
