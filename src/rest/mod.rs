//! REST API for driving wizard instances.
//!
//! Exposes the step request boundary over HTTP: construct an instance, load
//! a step, submit step values, refresh a step and abandon an instance.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use openapi::ApiDoc;
pub use server::{RestApiServer, RestApiStatus};
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        // Wizard endpoints
        .route("/api/v1/wizards", post(routes::wizards::create))
        .route(
            "/api/v1/wizards/:uniqueid/:recordid",
            delete(routes::wizards::abandon),
        )
        .route(
            "/api/v1/wizards/:uniqueid/:recordid/steps/:step",
            get(routes::wizards::load_step).post(routes::wizards::submit_step),
        )
        .route(
            "/api/v1/wizards/:uniqueid/:recordid/steps/:step/refresh",
            post(routes::wizards::refresh_step),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
