//! API error types and responses.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::forms::ValidationErrors;
use crate::wizard::WizardError;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// No cached wizard instance for the addressed key
    InvalidInstance(String),
    /// Step number outside the wizard's steps or sentinels
    InvalidStep(String),
    /// Submitted values rejected by the step form
    ValidationFailed(ValidationErrors),
    /// Bad request
    BadRequest(String),
    /// Internal server error
    InternalError(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Field name to message, only for validation failures
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInstance(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidStep(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code of the response body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInstance(_) => "invalid_instance",
            ApiError::InvalidStep(_) => "invalid_step",
            ApiError::ValidationFailed(_) => "validation_failed",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    /// Response body for this error
    pub fn into_body(self) -> ErrorResponse {
        let error = self.code().to_string();
        let (message, fields) = match self {
            ApiError::ValidationFailed(errors) => (errors.to_string(), errors.0),
            ApiError::InvalidInstance(msg)
            | ApiError::InvalidStep(msg)
            | ApiError::BadRequest(msg)
            | ApiError::InternalError(msg) => (msg, BTreeMap::new()),
        };
        ErrorResponse {
            error,
            message,
            fields,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.into_body())).into_response()
    }
}

impl From<WizardError> for ApiError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::InvalidInstance { .. } => ApiError::InvalidInstance(err.to_string()),
            WizardError::InvalidStep(_) => ApiError::InvalidStep(err.to_string()),
            WizardError::ValidationFailed(errors) => ApiError::ValidationFailed(errors),
            WizardError::UnknownManagerType(_)
            | WizardError::UnknownForm(_)
            | WizardError::InvalidConfiguration(_) => ApiError::BadRequest(err.to_string()),
            WizardError::Persistence(_) | WizardError::Render(_) | WizardError::Cache(_) => {
                tracing::error!(error = %err, "Wizard request failed");
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_invalid_instance_response() {
        let error = ApiError::from(WizardError::invalid_instance("signup", 0));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.error, "invalid_instance");
        assert!(json.message.contains("signup"));
        assert!(json.fields.is_empty());
    }

    #[tokio::test]
    async fn test_validation_failed_carries_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Required");
        let response = ApiError::from(WizardError::ValidationFailed(errors)).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.error, "validation_failed");
        assert_eq!(json.fields.get("email").map(String::as_str), Some("Required"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (WizardError::InvalidStep(-2), StatusCode::BAD_REQUEST),
            (
                WizardError::UnknownManagerType("bespoke".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                WizardError::Persistence("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
