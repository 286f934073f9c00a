//! Error taxonomy for the wizard core.

use thiserror::Error;

use crate::forms::ValidationErrors;

/// Errors raised while resolving, navigating or persisting a wizard instance
#[derive(Error, Debug)]
pub enum WizardError {
    #[error("no wizard instance for uniqueid '{uniqueid}' and recordid {recordid}")]
    InvalidInstance { uniqueid: String, recordid: i64 },

    #[error("invalid step: {0}")]
    InvalidStep(i64),

    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("unknown manager type '{0}'")]
    UnknownManagerType(String),

    #[error("unknown form class '{0}'")]
    UnknownForm(String),

    #[error("invalid wizard configuration: {0}")]
    InvalidConfiguration(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("rendering failed: {0}")]
    Render(String),

    #[error("step cache error: {0}")]
    Cache(String),
}

impl WizardError {
    pub fn invalid_instance(uniqueid: &str, recordid: i64) -> Self {
        WizardError::InvalidInstance {
            uniqueid: uniqueid.to_string(),
            recordid,
        }
    }
}

impl From<serde_json::Error> for WizardError {
    fn from(err: serde_json::Error) -> Self {
        WizardError::Cache(err.to_string())
    }
}

impl From<handlebars::RenderError> for WizardError {
    fn from(err: handlebars::RenderError) -> Self {
        WizardError::Render(err.to_string())
    }
}

pub type WizardResult<T> = Result<T, WizardError>;
