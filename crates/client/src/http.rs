//! HTTP client for the KidneyCompanion REST API.

use futures::StreamExt;

use kc_core::{AnalyzeRequest, StatusEvent, StreamEvent, TtsRequest};

use crate::decoder::EventStreamDecoder;
use crate::{ClientError, ClientResult};

/// Client for one KidneyCompanion server.
pub struct CompanionClient {
    http: reqwest::Client,
    base_url: String,
}

impl CompanionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Run one analysis, reporting progress through `on_status`.
    ///
    /// Consumes the event stream incrementally: each status event fires the
    /// callback, a `result` event is recorded while reading continues until
    /// the server closes the stream, and an `error` event fails the call.
    ///
    /// # Errors
    ///
    /// [`ClientError::Api`] for a pre-stream rejection (empty prompt,
    /// missing server credential), [`ClientError::Analysis`] for a terminal
    /// `error` event, [`ClientError::MissingResult`] when the stream closes
    /// without a result.
    pub async fn analyze<F>(
        &self,
        request: &AnalyzeRequest,
        mut on_status: F,
    ) -> ClientResult<String>
    where
        F: FnMut(&StatusEvent),
    {
        let response = self
            .http
            .post(format!("{}/api/analyze", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response.text().await.unwrap_or_default());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = EventStreamDecoder::new();
        let mut result = None;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for block in decoder.push(&chunk) {
                match block.parse() {
                    Some(StreamEvent::Status(status)) => on_status(&status),
                    Some(StreamEvent::Result(res)) => result = Some(res.result),
                    Some(StreamEvent::Error(err)) => {
                        return Err(ClientError::Analysis {
                            error: err.error,
                            details: err.details,
                        });
                    }
                    None => {}
                }
            }
        }

        result.ok_or(ClientError::MissingResult)
    }

    /// Request narration audio for a script. Returns MPEG bytes.
    ///
    /// # Errors
    ///
    /// [`ClientError::Api`] carrying the server's JSON error message on any
    /// non-success status.
    pub async fn tts(&self, text: &str) -> ClientResult<Vec<u8>> {
        let response = self
            .http
            .post(format!("{}/api/tts", self.base_url))
            .json(&TtsRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response.text().await.unwrap_or_default());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Pull the `error` field out of a JSON error body, falling back to the raw
/// body text.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body)
}
