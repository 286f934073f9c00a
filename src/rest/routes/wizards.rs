//! Wizard step endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::rest::dto::{
    CreateWizardRequest, LoadStepResponse, StepValuesRequest, SubmitStepResponse,
};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;

/// Construct or resume a wizard instance and render its first step
#[utoipa::path(
    post,
    path = "/api/v1/wizards",
    tag = "Wizards",
    request_body = CreateWizardRequest,
    responses(
        (status = 200, description = "First step rendered", body = LoadStepResponse),
        (status = 400, description = "Invalid wizard configuration", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(request): Json<CreateWizardRequest>,
) -> Result<Json<LoadStepResponse>, ApiError> {
    let output = state.handler.create(request.into_instance())?;
    Ok(Json(LoadStepResponse::from(output)))
}

/// Render a step of an existing wizard instance
#[utoipa::path(
    get,
    path = "/api/v1/wizards/{uniqueid}/{recordid}/steps/{step}",
    tag = "Wizards",
    params(
        ("uniqueid" = String, Path, description = "Wizard instance id chosen by the embedding page"),
        ("recordid" = i64, Path, description = "Record id, 0 when not yet persisted"),
        ("step" = i64, Path, description = "Step number; -1 review, -3 confirmed submit")
    ),
    responses(
        (status = 200, description = "Rendered step, or a return url once complete", body = LoadStepResponse),
        (status = 400, description = "Invalid step", body = ErrorResponse),
        (status = 404, description = "No such wizard instance", body = ErrorResponse),
        (status = 500, description = "Persisting the wizard failed", body = ErrorResponse)
    )
)]
pub async fn load_step(
    State(state): State<ApiState>,
    Path((uniqueid, recordid, step)): Path<(String, i64, i64)>,
) -> Result<Json<LoadStepResponse>, ApiError> {
    let output = state.handler.load_step(&uniqueid, recordid, step)?;
    Ok(Json(LoadStepResponse::from(output)))
}

/// Validate and save the values of a step
#[utoipa::path(
    post,
    path = "/api/v1/wizards/{uniqueid}/{recordid}/steps/{step}",
    tag = "Wizards",
    params(
        ("uniqueid" = String, Path, description = "Wizard instance id"),
        ("recordid" = i64, Path, description = "Record id"),
        ("step" = i64, Path, description = "Active step number")
    ),
    request_body = StepValuesRequest,
    responses(
        (status = 200, description = "Step values saved", body = SubmitStepResponse),
        (status = 400, description = "Invalid step", body = ErrorResponse),
        (status = 404, description = "No such wizard instance", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn submit_step(
    State(state): State<ApiState>,
    Path((uniqueid, recordid, step)): Path<(String, i64, i64)>,
    Json(request): Json<StepValuesRequest>,
) -> Result<Json<SubmitStepResponse>, ApiError> {
    state
        .handler
        .submit_step(&uniqueid, recordid, step, request.values)?;
    Ok(Json(SubmitStepResponse { step, saved: true }))
}

/// Re-render a step with overlaid values without saving them
#[utoipa::path(
    post,
    path = "/api/v1/wizards/{uniqueid}/{recordid}/steps/{step}/refresh",
    tag = "Wizards",
    params(
        ("uniqueid" = String, Path, description = "Wizard instance id"),
        ("recordid" = i64, Path, description = "Record id"),
        ("step" = i64, Path, description = "Active step number")
    ),
    request_body = StepValuesRequest,
    responses(
        (status = 200, description = "Step re-rendered", body = LoadStepResponse),
        (status = 400, description = "Invalid step", body = ErrorResponse),
        (status = 404, description = "No such wizard instance", body = ErrorResponse)
    )
)]
pub async fn refresh_step(
    State(state): State<ApiState>,
    Path((uniqueid, recordid, step)): Path<(String, i64, i64)>,
    Json(request): Json<StepValuesRequest>,
) -> Result<Json<LoadStepResponse>, ApiError> {
    let output = state
        .handler
        .refresh_step(&uniqueid, recordid, step, request.values)?;
    Ok(Json(LoadStepResponse::from(output)))
}

/// Abandon a wizard instance without persisting it
#[utoipa::path(
    delete,
    path = "/api/v1/wizards/{uniqueid}/{recordid}",
    tag = "Wizards",
    params(
        ("uniqueid" = String, Path, description = "Wizard instance id"),
        ("recordid" = i64, Path, description = "Record id")
    ),
    responses(
        (status = 204, description = "Wizard abandoned"),
        (status = 404, description = "No such wizard instance", body = ErrorResponse)
    )
)]
pub async fn abandon(
    State(state): State<ApiState>,
    Path((uniqueid, recordid)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    state.handler.abandon(&uniqueid, recordid)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::forms::FormRegistry;
    use crate::rest::build_router;
    use crate::templates::TemplateRenderer;
    use crate::wizard::{BehaviorRegistry, StepCache, WizardContext, WizardSettings};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> ApiState {
        let ctx = WizardContext::new(
            StepCache::in_memory(),
            FormRegistry::with_builtins(),
            BehaviorRegistry::with_defaults(None),
            TemplateRenderer::new().unwrap(),
            WizardSettings::default(),
        );
        ApiState::from_context(ctx, Config::default())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(state: &ApiState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn create_body() -> Value {
        json!({
            "uniqueid": "signup",
            "hasreview": true,
            "canmovesteps": true,
            "returnurl": "/done",
            "steps": [
                {"formclass": "demo_contact", "label": "Contact"},
                {"formclass": "demo_confirm", "label": "Confirm"}
            ]
        })
    }

    #[tokio::test]
    async fn test_create_then_load_step() {
        let state = test_state();
        let (status, body) = send(&state, json_request("POST", "/api/v1/wizards", create_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], json!(1));
        assert_eq!(body["formclass"], json!("demo_contact"));
        assert_eq!(body["returnurl"], json!(""));

        let request = Request::get("/api/v1/wizards/signup/0/steps/2")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        let data: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(data["disablenext"], json!(true));
        assert_eq!(data["disableprevious"], json!(false));
    }

    #[tokio::test]
    async fn test_load_step_unknown_instance() {
        let request = Request::get("/api/v1/wizards/nobody/0/steps/1")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&test_state(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("invalid_instance"));
    }

    #[tokio::test]
    async fn test_error_sentinel_step_is_rejected() {
        let state = test_state();
        send(&state, json_request("POST", "/api/v1/wizards", create_body())).await;
        let request = Request::get("/api/v1/wizards/signup/0/steps/-2")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("invalid_step"));
    }

    #[tokio::test]
    async fn test_submit_validation_failure() {
        let state = test_state();
        send(&state, json_request("POST", "/api/v1/wizards", create_body())).await;
        let (status, body) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/wizards/signup/0/steps/1",
                json!({"values": {"firstname": "Ada", "email": "not-an-email"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], json!("validation_failed"));
        assert_eq!(body["fields"]["email"], json!("Invalid email address"));
    }

    #[tokio::test]
    async fn test_review_and_terminal_over_http() {
        let state = test_state();
        send(&state, json_request("POST", "/api/v1/wizards", create_body())).await;
        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/wizards/signup/0/steps/1",
                json!({"values": {"firstname": "Ada", "email": "ada@example.org"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let review = Request::get("/api/v1/wizards/signup/0/steps/-1")
            .body(Body::empty())
            .unwrap();
        let (_, body) = send(&state, review).await;
        assert_eq!(body["step"], json!(-1));
        let data: Value = serde_json::from_str(body["data"].as_str().unwrap()).unwrap();
        assert_eq!(data["confirmation"], json!(true));

        let confirm = Request::get("/api/v1/wizards/signup/0/steps/-3")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&state, confirm).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["returnurl"], json!("/done"));

        let again = Request::get("/api/v1/wizards/signup/0/steps/-3")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&state, again).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_and_abandon() {
        let state = test_state();
        let body = json!({
            "uniqueid": "prefs",
            "steps": [{"formclass": "demo_preferences", "label": "Preferences"}]
        });
        send(&state, json_request("POST", "/api/v1/wizards", body)).await;

        let (status, body) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/wizards/prefs/0/steps/1/refresh",
                json!({"values": {"topic": "news"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_str().unwrap().contains("World news"));

        let delete = Request::delete("/api/v1/wizards/prefs/0")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&state, delete).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!state.handler.context().cache.exists("prefs", 0));
    }
}
