pub mod config;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod schema;
pub mod state;
pub mod testdata;
pub mod tracker;
pub mod validator;

use std::any::Any;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;

use handlers::ApiError;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StoryTests API",
        description = "Turns user stories into validated test cases"
    ),
    paths(
        handlers::generate_tests,
        handlers::fetch_issue,
        handlers::generate_test_data,
        handlers::export_csv,
        handlers::health,
        handlers::readiness,
    ),
    components(schemas(
        models::GenerationRequest,
        models::GenerationResponse,
        models::TestCase,
        models::TestCategory,
        models::TestFormat,
        models::HealthResponse,
        schema::Violation,
        tracker::TrackerIssue,
        handlers::ErrorBody,
        handlers::StructuredApiError,
        handlers::tracker::FetchIssueRequest,
        handlers::tracker::FetchIssueResponse,
    )),
    tags(
        (name = "generation", description = "LLM-backed test case generation"),
        (name = "tracker", description = "Issue tracker lookups"),
        (name = "testdata", description = "Synthetic cases and CSV export"),
        (name = "health", description = "Liveness and readiness"),
    )
)]
pub struct ApiDoc;

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health))
        .route("/api/health/ready", get(handlers::readiness))
        .route("/api/openapi.json", get(handlers::openapi_json))
        // Generation
        .route("/api/generate", post(handlers::generate_tests))
        // Issue tracker
        .route("/api/jira/fetch", post(handlers::fetch_issue))
        // Synthetic data & export
        .route("/api/testdata/generate", post(handlers::generate_test_data))
        .route("/api/testdata/csv", post(handlers::export_csv))
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Anything that escapes a handler as a panic becomes an opaque 500.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
