//! Application state, resolved once at startup.

use std::sync::Arc;

use kc_inference::{
    Gateway, MedGemmaClient, RetrySchedule, SpeechConfig, SpeechSynthesizer, UpstreamConfig,
};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.friendli.ai/dedicated/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "dep0ju34hez4juy";
pub const DEFAULT_TTS_URL: &str = "https://api.elevenlabs.io";

/// Shared state for all REST handlers.
///
/// Either client may be absent when its credential is not configured; the
/// handlers surface a clear error at request time rather than refusing to
/// start, so the rest of the API stays usable.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Option<Arc<Gateway<MedGemmaClient>>>,
    pub tts: Option<Arc<SpeechSynthesizer>>,
}

impl AppState {
    /// Build state from environment variables.
    ///
    /// # Environment Variables
    /// - `FRIENDLI_API_KEY`: inference credential (analyze disabled if unset)
    /// - `KC_UPSTREAM_URL`: chat-completions endpoint (default: FriendliAI dedicated)
    /// - `KC_MODEL`: deployed model identifier
    /// - `ELEVENLABS_API_KEY`: speech credential (narration disabled if unset)
    /// - `KC_TTS_URL`: speech API base URL
    ///
    /// # Errors
    /// Returns an error if a credential is present but the derived client
    /// configuration is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        let gateway = match std::env::var("FRIENDLI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                let base_url = std::env::var("KC_UPSTREAM_URL")
                    .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.into());
                let model = std::env::var("KC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
                let config = UpstreamConfig::new(base_url, key, model)?;
                Some(Arc::new(Gateway::new(
                    MedGemmaClient::new(config),
                    RetrySchedule::default(),
                )))
            }
            _ => {
                tracing::warn!("FRIENDLI_API_KEY not set; analyze endpoint disabled");
                None
            }
        };

        let tts = match std::env::var("ELEVENLABS_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                let base_url =
                    std::env::var("KC_TTS_URL").unwrap_or_else(|_| DEFAULT_TTS_URL.into());
                let config = SpeechConfig::new(base_url, key)?;
                Some(Arc::new(SpeechSynthesizer::new(config)))
            }
            _ => {
                tracing::warn!("ELEVENLABS_API_KEY not set; narration endpoint disabled");
                None
            }
        };

        Ok(Self { gateway, tts })
    }

    /// State with no upstream clients, used in tests and for serving only
    /// the health and documentation routes.
    pub fn disconnected() -> Self {
        Self {
            gateway: None,
            tts: None,
        }
    }
}
