//! # KidneyCompanion Client
//!
//! Client-side consumer of the analyze event stream, plus a thin HTTP
//! client for the REST API. The decoder reassembles server-sent-event
//! blocks from arbitrary byte chunks; [`CompanionClient::analyze`] drives a
//! full request and surfaces status updates through a callback while the
//! retry loop runs server-side.

pub mod decoder;
pub mod http;

pub use decoder::{EventStreamDecoder, RawEvent};
pub use http::CompanionClient;

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("{error}")]
    Analysis {
        error: String,
        details: Option<String>,
    },
    #[error("No response from MedGemma. Please try again.")]
    MissingResult,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
