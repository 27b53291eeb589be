//! Shared schema types for lab values and the analyze wire contract.
//!
//! These types are serialized on the wire between the CLI client and the REST
//! API, and are also embedded into prompts. Field names use camelCase to match
//! the published JSON contract.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single lab value as entered by the patient or extracted from a photo.
///
/// The value is kept as free text (e.g. `"1.6 mg/dL (H)"`) because lab sheets
/// mix units, flags and qualifiers; numeric interpretation happens in
/// [`crate::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LabEntry {
    pub name: String,
    pub value: String,
}

/// A dated set of past lab values, used for trend analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoricalPoint {
    /// Date of the past report, free text (typically `YYYY-MM-DD`).
    pub date: String,
    pub labs: Vec<LabEntry>,
}

/// Optional patient context that personalises the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months_post_transplant: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}

impl PatientContext {
    /// True when at least one field that influences the prompt is present.
    pub fn is_meaningful(&self) -> bool {
        self.age.is_some()
            || self.sex.is_some()
            || self.months_post_transplant.is_some()
            || self.medications.is_some()
    }
}

/// Request body for `POST /api/analyze`.
///
/// Constructed once per analysis attempt and immutable for the lifetime of
/// the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Fully built analysis or extraction prompt. Must be non-empty; an
    /// absent field deserializes to empty so validation can reject it with
    /// the same message as a blank one.
    #[serde(default)]
    pub prompt: String,
    /// Base64-encoded JPEG bytes of a lab report photo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl AnalyzeRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_base64: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image_base64: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image_base64: Some(image_base64.into()),
        }
    }
}

/// Request body for `POST /api/tts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TtsRequest {
    /// Plain narration text. Truncated server-side to the TTS ceiling.
    /// An absent field deserializes to empty and is rejected as blank.
    #[serde(default)]
    pub text: String,
}
