//! Lab status classification.
//!
//! Mirrors the badge logic shown next to each value in the results view:
//! a value is compared against the transplant target range first, with
//! concern thresholds taking precedence. The within-target / needs-review
//! counts feed the narration condenser.

use std::sync::OnceLock;

use regex::Regex;

use crate::labs::LabEntry;
use crate::ranges::reference_range;

/// Classification of a single lab value against its transplant target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabStatus {
    /// Inside the transplant target range.
    WithinTarget,
    /// Numeric but above the transplant target (not yet at a concern threshold).
    AboveTarget,
    /// Numeric but below the transplant target.
    BelowTarget,
    /// At or past a concern threshold; worth raising with the care team.
    Discuss,
    /// Unknown lab, unparseable value, or a range with no numeric form.
    Unknown,
}

/// Within-target vs. needs-review counts over a lab panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub within_target: usize,
    pub needs_review: usize,
}

impl StatusSummary {
    /// Tally a panel. Anything that is not clearly within target counts as
    /// needing review, matching the results-view badge totals.
    pub fn from_labs(labs: &[LabEntry]) -> Self {
        let within_target = labs
            .iter()
            .filter(|l| classify_lab(&l.name, &l.value) == LabStatus::WithinTarget)
            .count();
        Self {
            within_target,
            needs_review: labs.len() - within_target,
        }
    }
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\d.]+").expect("static regex"))
}

fn span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\d.]+)[\u{2013}-]([\d.]+)").expect("static regex"))
}

/// Extract the first decimal number from a free-text lab value.
///
/// `"1.6 mg/dL (H)"` parses as `1.6`; values with no digits yield `None`.
pub fn parse_numeric(value: &str) -> Option<f64> {
    numeric_re()
        .find(value)?
        .as_str()
        .parse::<f64>()
        .ok()
}

/// Classify one lab value against its transplant reference data.
pub fn classify_lab(name: &str, value: &str) -> LabStatus {
    let Some(range) = reference_range(name) else {
        return LabStatus::Unknown;
    };
    let Some(num) = parse_numeric(value) else {
        return LabStatus::Unknown;
    };

    if let Some(high) = range.concern_high {
        if num >= high {
            return LabStatus::Discuss;
        }
    }
    if let Some(low) = range.concern_low {
        if num <= low {
            return LabStatus::Discuss;
        }
    }

    // Transplant targets come in two textual forms: "a-b (...)" and ">t".
    if let Some(caps) = span_re().captures(range.transplant) {
        let low = caps[1].parse::<f64>().ok();
        let high = caps[2].parse::<f64>().ok();
        if let (Some(low), Some(high)) = (low, high) {
            if num >= low && num <= high {
                return LabStatus::WithinTarget;
            }
            if num < low {
                return LabStatus::BelowTarget;
            }
            return LabStatus::AboveTarget;
        }
    }

    if range.transplant.contains('>') {
        let threshold = range
            .transplant
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .parse::<f64>()
            .ok();
        if let Some(threshold) = threshold {
            if num >= threshold {
                return LabStatus::WithinTarget;
            }
            return LabStatus::BelowTarget;
        }
    }

    LabStatus::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, value: &str) -> LabEntry {
        LabEntry {
            name: name.into(),
            value: value.into(),
        }
    }

    #[test]
    fn test_parse_numeric_takes_first_number() {
        assert_eq!(parse_numeric("1.6 mg/dL (H)"), Some(1.6));
        assert_eq!(parse_numeric("52 mL/min/1.73m\u{b2}"), Some(52.0));
        assert_eq!(parse_numeric("pending"), None);
    }

    #[test]
    fn test_classify_within_transplant_target() {
        // Above the "healthy" 0.6-1.2 range but inside the transplant target.
        assert_eq!(classify_lab("Creatinine", "1.4 mg/dL"), LabStatus::WithinTarget);
    }

    #[test]
    fn test_classify_concern_threshold_wins() {
        assert_eq!(classify_lab("Creatinine", "2.3 mg/dL"), LabStatus::Discuss);
        assert_eq!(classify_lab("eGFR", "25"), LabStatus::Discuss);
    }

    #[test]
    fn test_classify_above_and_below_target() {
        assert_eq!(classify_lab("Creatinine", "1.9"), LabStatus::AboveTarget);
        assert_eq!(classify_lab("Creatinine", "0.8"), LabStatus::BelowTarget);
    }

    #[test]
    fn test_classify_unknown_lab_or_value() {
        assert_eq!(classify_lab("Ferritin", "88"), LabStatus::Unknown);
        assert_eq!(classify_lab("Creatinine", "n/a"), LabStatus::Unknown);
    }

    #[test]
    fn test_summary_counts() {
        let labs = vec![
            entry("Creatinine", "1.4"),
            entry("Potassium", "5.9"),
            entry("Ferritin", "88"),
        ];
        let summary = StatusSummary::from_labs(&labs);
        assert_eq!(summary.within_target, 1);
        assert_eq!(summary.needs_review, 2);
    }
}
