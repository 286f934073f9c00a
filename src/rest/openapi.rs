//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::rest::dto::{
    CreateWizardRequest, HealthResponse, LoadStepResponse, StepDefinitionRequest,
    StepValuesRequest, SubmitStepResponse,
};
use crate::rest::error::ErrorResponse;

/// OpenAPI documentation for the multistep REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Multistep API",
        description = "REST API for server-driven multi-step form wizards.",
        license(name = "MIT")
    ),
    paths(
        crate::rest::routes::health::health,
        crate::rest::routes::wizards::create,
        crate::rest::routes::wizards::load_step,
        crate::rest::routes::wizards::submit_step,
        crate::rest::routes::wizards::refresh_step,
        crate::rest::routes::wizards::abandon,
    ),
    components(
        schemas(
            // Response types
            HealthResponse,
            LoadStepResponse,
            SubmitStepResponse,
            ErrorResponse,
            // Request types
            CreateWizardRequest,
            StepDefinitionRequest,
            StepValuesRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Wizards", description = "Wizard construction and step navigation"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
