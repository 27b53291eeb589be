//! Transplant-specific reference ranges for common lab panels.
//!
//! Post-transplant targets differ from the "healthy adult" ranges printed on
//! a standard lab sheet, and the difference is exactly what worries patients.
//! This table carries both ranges plus patient-facing context for each lab,
//! and is embedded into analysis prompts and shown by the CLI.
//!
//! The data is immutable lookup material; no shared mutable state.

/// Reference data for one lab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabRange {
    pub name: &'static str,
    pub unit: &'static str,
    /// General healthy adult range, as printed on a standard lab sheet.
    pub healthy: &'static str,
    /// Typical target for a functioning transplant graft.
    pub transplant: &'static str,
    /// Value at or above which the result is flagged for the care team.
    pub concern_high: Option<f64>,
    /// Value at or below which the result is flagged for the care team.
    pub concern_low: Option<f64>,
    /// Patient-facing explanation of why this lab behaves differently
    /// after a transplant.
    pub context: &'static str,
}

/// Look up the reference range for a lab by its exact display name.
pub fn reference_range(name: &str) -> Option<&'static LabRange> {
    TRANSPLANT_RANGES.iter().find(|r| r.name == name)
}

/// Display order for the lab picker and the `kc ranges` listing.
pub const COMMON_LABS: &[&str] = &[
    "Creatinine",
    "eGFR",
    "Potassium",
    "BUN",
    "Tacrolimus Level",
    "Hemoglobin",
    "Phosphorus",
    "Albumin",
    "Calcium",
    "Magnesium",
    "Sodium",
    "Glucose (Fasting)",
    "CO2 (Bicarbonate)",
    "WBC",
    "Uric Acid",
    "ALT",
    "AST",
    "Platelets",
    "Chloride",
];

pub const TRANSPLANT_RANGES: &[LabRange] = &[
    LabRange {
        name: "Creatinine",
        unit: "mg/dL",
        healthy: "0.6-1.2",
        transplant: "1.0-1.8 (stable graft)",
        concern_high: Some(2.0),
        concern_low: None,
        context: "Post-transplant creatinine depends on donor kidney quality, time since transplant, and immunosuppressant levels. A stable creatinine, even if above 'normal', is often more important than the absolute number.",
    },
    LabRange {
        name: "eGFR",
        unit: "mL/min/1.73m\u{b2}",
        healthy: ">90",
        transplant: "30-70 (common functioning graft)",
        concern_high: None,
        concern_low: Some(30.0),
        context: "Most transplanted kidneys don't achieve eGFR >90. 50-60 can be perfectly stable for years. Trend over months matters far more than any single reading.",
    },
    LabRange {
        name: "Potassium",
        unit: "mmol/L",
        healthy: "3.5-5.0",
        transplant: "3.5-5.2",
        concern_high: Some(5.5),
        concern_low: None,
        context: "Tacrolimus and calcineurin inhibitors commonly raise potassium. Mildly elevated levels (5.0-5.3) are frequent in transplant patients.",
    },
    LabRange {
        name: "BUN",
        unit: "mg/dL",
        healthy: "7-20",
        transplant: "10-30",
        concern_high: Some(35.0),
        concern_low: None,
        context: "BUN rises with dehydration, high-protein diet, or reduced graft function. Less specific than creatinine but useful as a supporting indicator.",
    },
    LabRange {
        name: "Tacrolimus Level",
        unit: "ng/mL",
        healthy: "N/A",
        transplant: "5-12 (varies by time post-transplant)",
        concern_high: Some(15.0),
        concern_low: None,
        context: "Most common anti-rejection drug. Too high risks kidney toxicity; too low risks rejection. Target ranges decrease over time.",
    },
    LabRange {
        name: "Phosphorus",
        unit: "mg/dL",
        healthy: "2.5-4.5",
        transplant: "2.0-4.5",
        concern_high: None,
        concern_low: Some(1.5),
        context: "A new transplant often 'wastes' phosphorus due to residual parathyroid hormone elevation.",
    },
    LabRange {
        name: "Hemoglobin",
        unit: "g/dL",
        healthy: "12-17",
        transplant: "10-15",
        concern_high: None,
        concern_low: Some(9.0),
        context: "Anemia is common early post-transplant from medications or residual CKD effects. Usually improves over 6-12 months.",
    },
    LabRange {
        name: "Albumin",
        unit: "g/dL",
        healthy: "3.5-5.5",
        transplant: "3.5-5.5",
        concern_high: None,
        concern_low: Some(3.0),
        context: "Low albumin can indicate poor nutrition, inflammation, or protein loss.",
    },
    LabRange {
        name: "Calcium",
        unit: "mg/dL",
        healthy: "8.5-10.5",
        transplant: "8.5-10.5",
        concern_high: Some(11.0),
        concern_low: Some(7.5),
        context: "Calcium levels can be affected by parathyroid hormone changes common after transplant. Persistent elevation may need evaluation.",
    },
    LabRange {
        name: "Magnesium",
        unit: "mg/dL",
        healthy: "1.7-2.2",
        transplant: "1.5-2.2",
        concern_high: None,
        concern_low: Some(1.3),
        context: "Tacrolimus and other calcineurin inhibitors commonly cause magnesium wasting. Supplementation is often needed.",
    },
    LabRange {
        name: "Sodium",
        unit: "mmol/L",
        healthy: "136-145",
        transplant: "136-145",
        concern_high: Some(148.0),
        concern_low: Some(130.0),
        context: "Sodium levels reflect fluid balance. Mild abnormalities are common and often relate to hydration status.",
    },
    LabRange {
        name: "Chloride",
        unit: "mmol/L",
        healthy: "98-106",
        transplant: "98-106",
        concern_high: Some(110.0),
        concern_low: Some(95.0),
        context: "Usually changes alongside sodium. Helps assess acid-base balance.",
    },
    LabRange {
        name: "CO2 (Bicarbonate)",
        unit: "mmol/L",
        healthy: "23-29",
        transplant: "22-29",
        concern_high: None,
        concern_low: Some(18.0),
        context: "Low bicarbonate (metabolic acidosis) can occur with reduced kidney function. Mild decreases are common in transplant patients.",
    },
    LabRange {
        name: "Glucose (Fasting)",
        unit: "mg/dL",
        healthy: "70-100",
        transplant: "70-130",
        concern_high: Some(200.0),
        concern_low: None,
        context: "Post-transplant diabetes (PTDM) is common due to steroid and tacrolimus use. Blood sugar monitoring is important.",
    },
    LabRange {
        name: "WBC",
        unit: "x10\u{b3}/\u{b5}L",
        healthy: "4.5-11.0",
        transplant: "3.5-11.0",
        concern_high: Some(15.0),
        concern_low: Some(3.0),
        context: "Immunosuppressants like mycophenolate can lower white blood cell counts. Low WBC increases infection risk.",
    },
    LabRange {
        name: "Uric Acid",
        unit: "mg/dL",
        healthy: "3.0-7.0",
        transplant: "3.0-8.5",
        concern_high: Some(9.0),
        concern_low: None,
        context: "Elevated uric acid is common after transplant due to calcineurin inhibitors and reduced kidney clearance. May increase gout risk.",
    },
    LabRange {
        name: "ALT",
        unit: "U/L",
        healthy: "7-56",
        transplant: "7-56",
        concern_high: Some(100.0),
        concern_low: None,
        context: "Liver enzyme. Monitored because some immunosuppressants can affect liver function.",
    },
    LabRange {
        name: "AST",
        unit: "U/L",
        healthy: "10-40",
        transplant: "10-40",
        concern_high: Some(100.0),
        concern_low: None,
        context: "Liver enzyme often checked alongside ALT. Elevation may warrant medication review.",
    },
    LabRange {
        name: "Platelets",
        unit: "x10\u{b3}/\u{b5}L",
        healthy: "150-400",
        transplant: "150-400",
        concern_high: None,
        concern_low: Some(100.0),
        context: "Low platelets can occur with certain medications. Usually stable in transplant patients.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_common_lab_has_a_range() {
        for name in COMMON_LABS {
            assert!(
                reference_range(name).is_some(),
                "missing range for {name}"
            );
        }
    }

    #[test]
    fn test_reference_range_is_exact_match() {
        assert!(reference_range("Creatinine").is_some());
        assert!(reference_range("creatinine").is_none());
        assert!(reference_range("Ferritin").is_none());
    }
}
