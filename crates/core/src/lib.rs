//! # KidneyCompanion Core
//!
//! Core domain logic for the KidneyCompanion lab-analysis system.
//!
//! This crate contains pure, transport-free building blocks:
//! - Shared schema types for labs, patient context and the analyze wire contract
//! - Transplant-specific reference ranges for common lab panels
//! - Lab status classification (within target vs. needs review)
//! - Prompt construction for analysis and photo extraction
//! - Parsing of lab values extracted from a report photo
//! - Condensation of a long markdown analysis into a short narration script
//!
//! **No API concerns**: HTTP servers, upstream model calls, or retry policy
//! belong in `api-rest` and `kc-inference`.

pub mod event;
pub mod extraction;
pub mod labs;
pub mod narration;
pub mod prompt;
pub mod ranges;
pub mod status;

pub use event::{ErrorEvent, ResultEvent, StatusEvent, StatusPhase, StreamEvent};
pub use labs::{AnalyzeRequest, HistoricalPoint, LabEntry, PatientContext, TtsRequest};
pub use ranges::{reference_range, LabRange, COMMON_LABS};
pub use status::{classify_lab, LabStatus, StatusSummary};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("couldn't read lab values from that reply; try a clearer photo or enter the values manually ({0})")]
    Extraction(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
