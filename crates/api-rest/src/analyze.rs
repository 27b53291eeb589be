//! The analyze endpoint: one POST, one event stream.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use kc_core::AnalyzeRequest;
use kc_inference::{validate_request, GatewayError};

use crate::error::ApiError;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Event stream of status updates followed by one terminal result or error event"),
        (status = 400, description = "Prompt missing or blank"),
        (status = 500, description = "Inference credential not configured")
    )
)]
/// Run a lab-results analysis, streaming progress while the upstream model
/// wakes up.
///
/// Validation failures and a missing credential are rejected as plain JSON
/// errors before any stream starts. Once streaming begins, every outcome
/// arrives as an event; the gateway loop runs in its own task and stops on
/// its own when the client disconnects and the channel closes.
///
/// # Errors
/// Returns `400 Bad Request` if the prompt is missing or blank, and
/// `500 Internal Server Error` if `FRIENDLI_API_KEY` is not configured.
#[axum::debug_handler]
pub async fn analyze(
    State(state): State<AppState>,
    axum::Json(request): axum::Json<AnalyzeRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if let Err(err) = validate_request(&request) {
        return Err(ApiError::bad_request(err.to_string()));
    }

    let Some(gateway) = state.gateway.clone() else {
        return Err(ApiError::internal(
            GatewayError::MissingCredential.to_string(),
        ));
    };

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        gateway.run(&request, &tx).await;
    });

    let stream = UnboundedReceiverStream::new(rx)
        .map(|ev| Ok(Event::default().event(ev.name()).data(ev.to_data())));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
