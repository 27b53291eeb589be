//! Speech-synthesis client.
//!
//! Forwards narration text to an ElevenLabs-style voice API and returns the
//! raw MPEG audio bytes. This call is stateless and independent of the
//! analyze gateway; it shares no state between requests.

use serde::Serialize;

use crate::{GatewayError, GatewayResult};

/// Hard ceiling applied to narration text before synthesis.
pub const MAX_TTS_CHARS: usize = 4000;

/// Rachel: a warm, caring voice suited to medical narration.
const VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const TTS_MODEL: &str = "eleven_flash_v2_5";

const STABILITY: f32 = 0.65;
const SIMILARITY_BOOST: f32 = 0.8;
const STYLE: f32 = 0.15;

/// Speech API configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    base_url: String,
    api_key: String,
}

impl SpeechConfig {
    /// Create a new `SpeechConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidConfig`] if either value is blank.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> GatewayResult<Self> {
        let base_url = base_url.into();
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "speech API key cannot be empty".into(),
            ));
        }
        if base_url.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "speech API URL cannot be empty".into(),
            ));
        }
        Ok(Self { base_url, api_key })
    }
}

#[derive(Serialize)]
struct SpeechRequestBody<'a> {
    text: &'a str,
    model_id: &'static str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

/// Client for the upstream text-to-speech service.
pub struct SpeechSynthesizer {
    http: reqwest::Client,
    config: SpeechConfig,
}

impl SpeechSynthesizer {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Synthesize narration audio for `text`.
    ///
    /// The text is trimmed and truncated to [`MAX_TTS_CHARS`] before the
    /// call. Returns MPEG audio bytes.
    ///
    /// # Errors
    ///
    /// [`GatewayError::EmptyText`] for blank input, [`GatewayError::Speech`]
    /// for a non-success upstream status, [`GatewayError::Transport`] for
    /// network failures.
    pub async fn synthesize(&self, text: &str) -> GatewayResult<Vec<u8>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(GatewayError::EmptyText);
        }
        let truncated = kc_core::narration::truncate_chars(trimmed, MAX_TTS_CHARS);

        let url = format!("{}/v1/text-to-speech/{VOICE_ID}", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&SpeechRequestBody {
                text: &truncated,
                model_id: TTS_MODEL,
                voice_settings: VoiceSettings {
                    stability: STABILITY,
                    similarity_boost: SIMILARITY_BOOST,
                    style: STYLE,
                    use_speaker_boost: true,
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "speech synthesis failed: {body}");
            return Err(GatewayError::Speech {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_text_is_rejected_without_a_call() {
        let config = SpeechConfig::new("https://example.test", "key").unwrap();
        let synth = SpeechSynthesizer::new(config);
        let err = synth.synthesize("   \n  ").await.unwrap_err();
        assert!(matches!(err, GatewayError::EmptyText));
    }

    #[test]
    fn test_config_rejects_blank_key() {
        assert!(SpeechConfig::new("https://example.test", "").is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let body = SpeechRequestBody {
            text: "hello",
            model_id: TTS_MODEL,
            voice_settings: VoiceSettings {
                stability: STABILITY,
                similarity_boost: SIMILARITY_BOOST,
                style: STYLE,
                use_speaker_boost: true,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model_id"], "eleven_flash_v2_5");
        assert_eq!(value["voice_settings"]["use_speaker_boost"], true);
    }
}
