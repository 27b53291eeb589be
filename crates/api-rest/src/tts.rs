//! The narration endpoint.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use kc_core::TtsRequest;
use kc_inference::GatewayError;

use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/tts",
    request_body = TtsRequest,
    responses(
        (status = 200, description = "MPEG audio bytes", content_type = "audio/mpeg"),
        (status = 400, description = "Text missing or blank"),
        (status = 500, description = "Speech credential not configured or synthesis failed")
    )
)]
/// Synthesize narration audio for a script.
///
/// Upstream failure detail goes to the log; the client gets a generic
/// retryable message.
///
/// # Errors
/// Returns `400 Bad Request` for blank text and `500 Internal Server Error`
/// when `ELEVENLABS_API_KEY` is not configured or synthesis fails.
#[axum::debug_handler]
pub async fn tts(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<TtsRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request(GatewayError::EmptyText.to_string()));
    }

    let Some(synth) = state.tts else {
        return Err(ApiError::internal(
            "ELEVENLABS_API_KEY not set in environment secrets",
        ));
    };

    match synth.synthesize(&request.text).await {
        Ok(audio) => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/mpeg".to_string()),
                (header::CONTENT_LENGTH, audio.len().to_string()),
            ],
            audio,
        )
            .into_response()),
        Err(err) => {
            tracing::error!("narration synthesis failed: {err}");
            Err(ApiError::internal(
                "Failed to generate audio. Please try again.",
            ))
        }
    }
}
