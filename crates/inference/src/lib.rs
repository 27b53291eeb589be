//! # KidneyCompanion Inference
//!
//! The server-side inference layer: the upstream chat-completion client, the
//! fixed wake-up retry schedule, the streaming gateway that reports progress
//! while a cold dedicated endpoint warms up, and the speech-synthesis client.
//!
//! The gateway is deliberately transport-agnostic: it talks to the upstream
//! through the [`ChatCompletions`] trait and reports progress through an
//! event channel, so the whole retry state machine is testable with fakes
//! and a paused clock.

pub mod gateway;
pub mod schedule;
pub mod tts;
pub mod upstream;

pub use gateway::{validate_request, EventSink, Gateway};
pub use schedule::RetrySchedule;
pub use tts::{SpeechConfig, SpeechSynthesizer, MAX_TTS_CHARS};
pub use upstream::{AttemptOutcome, ChatCompletions, MedGemmaClient, UpstreamConfig};

/// Errors surfaced by the inference layer.
///
/// Classification drives handling: client input and configuration errors are
/// rejected before any streaming begins; `Unavailable` is the only retryable
/// signal; everything else is terminal and reported once on the stream.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid request: prompt is required")]
    EmptyPrompt,
    #[error("FRIENDLI_API_KEY not set in environment secrets")]
    MissingCredential,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("FriendliAI API error: {status}")]
    Upstream { status: u16, body: String },
    #[error("MedGemma is still waking up. Please wait a moment and try again.")]
    Exhausted,
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Non-empty text is required")]
    EmptyText,
    #[error("speech synthesis error: {status}")]
    Speech { status: u16, body: String },
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
