//! Parsing of lab values extracted from a report photo.
//!
//! The extraction prompt asks the model for a bare JSON array, but replies
//! routinely arrive wrapped in code fences or prose anyway. Parsing is
//! therefore lenient about the surroundings and strict about the payload:
//! the bracketed array must deserialize as `[{name, value}, ...]`.
//!
//! A failure here is recoverable user input, not a fault: the caller shows
//! the message and offers manual entry instead.

use crate::labs::LabEntry;
use crate::{CoreError, CoreResult};

/// Parse the model's extraction reply into lab entries.
///
/// Entries with a blank name or value are dropped; an empty final list is an
/// error because the caller has nothing to proceed with.
///
/// # Errors
///
/// Returns [`CoreError::Extraction`] when no well-formed, non-empty JSON
/// array of `{name, value}` objects can be found in the reply.
pub fn parse_extracted_labs(reply: &str) -> CoreResult<Vec<LabEntry>> {
    let body = strip_code_fences(reply);

    let start = body.find('[');
    let end = body.rfind(']');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(CoreError::Extraction("no JSON array in reply".into()));
    };
    if end < start {
        return Err(CoreError::Extraction("no JSON array in reply".into()));
    }

    let parsed: Vec<LabEntry> = serde_json::from_str(&body[start..=end])
        .map_err(|err| CoreError::Extraction(err.to_string()))?;

    let labs: Vec<LabEntry> = parsed
        .into_iter()
        .filter(|l| !l.name.trim().is_empty() && !l.value.trim().is_empty())
        .collect();

    if labs.is_empty() {
        return Err(CoreError::Extraction("the array held no usable entries".into()));
    }

    tracing::debug!(count = labs.len(), "parsed extracted labs");
    Ok(labs)
}

fn strip_code_fences(reply: &str) -> String {
    reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}
