//! # API REST
//!
//! REST API implementation for KidneyCompanion.
//!
//! Handles:
//! - HTTP endpoints with axum (analyze event stream, narration audio, health)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! All inference semantics live in `kc-inference`; this crate only adapts
//! them to HTTP.

#![warn(rust_2018_idioms)]

pub mod analyze;
pub mod error;
pub mod state;
pub mod tts;

pub use error::ApiError;
pub use state::AppState;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Health check response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, analyze::analyze, tts::tts),
    components(schemas(
        HealthRes,
        kc_core::AnalyzeRequest,
        kc_core::TtsRequest,
        kc_core::PatientContext,
        kc_core::LabEntry,
        kc_core::HistoricalPoint,
    ))
)]
struct ApiDoc;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Always succeeds,
/// regardless of whether the upstream credentials are configured.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "KidneyCompanion REST API is alive".into(),
    })
}

/// Build the application router with all routes, documentation, and CORS.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze::analyze))
        .route("/api/tts", post(tts::tts))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve the API until the process is stopped.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails
/// while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- KidneyCompanion REST API listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    fn test_app() -> Router {
        create_router(AppState::disconnected())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_alive() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_prompt_before_streaming() {
        let response = test_app()
            .oneshot(post_json("/api/analyze", r#"{"prompt":"   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid request: prompt is required");
    }

    #[tokio::test]
    async fn test_analyze_rejects_absent_prompt_field() {
        let response = test_app()
            .oneshot(post_json("/api/analyze", r#"{"imageBase64":"QUJD"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid request: prompt is required");
    }

    #[tokio::test]
    async fn test_tts_rejects_absent_text_field() {
        let response = test_app()
            .oneshot(post_json("/api/tts", r#"{}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Non-empty text is required");
    }

    #[tokio::test]
    async fn test_analyze_without_credential_is_plain_json_error() {
        let response = test_app()
            .oneshot(post_json("/api/analyze", r#"{"prompt":"explain my labs"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "FRIENDLI_API_KEY not set in environment secrets"
        );
    }

    #[tokio::test]
    async fn test_tts_rejects_blank_text() {
        let response = test_app()
            .oneshot(post_json("/api/tts", r#"{"text":""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Non-empty text is required");
    }

    #[tokio::test]
    async fn test_tts_without_credential_is_internal_error() {
        let response = test_app()
            .oneshot(post_json("/api/tts", r#"{"text":"Hi, this is your summary."}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "ELEVENLABS_API_KEY not set in environment secrets"
        );
    }
}
