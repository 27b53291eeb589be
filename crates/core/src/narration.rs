//! Condensation of a markdown analysis into a short narration script.
//!
//! Speech synthesis has a practical length and cost ceiling, and a full
//! markdown document read aloud verbatim is unusable anyway. This pass
//! strips the markup and scrapes the sections a listener actually wants:
//! the key takeaways and the recommendations. It is explicitly heuristic;
//! when the expected section markers are missing it degrades to bullet
//! scraping, and then to just the fixed intro and closing sentences.
//!
//! The script never mutates the on-screen analysis text and is never
//! persisted.

use std::sync::OnceLock;

use regex::Regex;

use crate::status::StatusSummary;

/// Hard ceiling on the narration script, matching the TTS route's limit.
pub const MAX_NARRATION_CHARS: usize = 4000;

const INTRO: &str = "Here's a summary of your lab results.";
const KEY_POINTS_LEAD: &str = "Here are the key points:";
const RECOMMENDATIONS_LEAD: &str = "Some recommendations for you:";
const CLOSING: &str = "Remember, this is for your understanding only. Please share these results with your transplant team for personalized medical advice. You're doing a great job staying on top of your health!";

/// Case-insensitive substrings that open a key-takeaway section.
const FINDING_MARKERS: &[&str] = &[
    "overall",
    "summary",
    "key takeaway",
    "bottom line",
    "in short",
    "good news",
];

/// Case-insensitive substrings that open a recommendations section.
const RECOMMENDATION_MARKERS: &[&str] = &["recommendation", "next step", "action"];

const MAX_KEY_FINDINGS: usize = 5;
const MAX_FALLBACK_BULLETS: usize = 4;
const MAX_RECOMMENDATIONS: usize = 3;

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("static regex"))
}

fn italic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*(.+?)\*").expect("static regex"))
}

fn arrow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^->\s+").expect("static regex"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:#{1,3}\s*|[-*\u{2022}]\s*)").expect("static regex"))
}

fn numbered_bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:#{1,3}\s*|[-*\u{2022}\d.]\s*)").expect("static regex"))
}

/// Strip emphasis and arrow markup. Heading markers are kept because the
/// section loops below use them as boundaries; they are removed per emitted
/// line instead.
fn strip_markup(analysis: &str) -> String {
    let plain = bold_re().replace_all(analysis, "$1");
    let plain = italic_re().replace_all(&plain, "$1");
    let plain = arrow_re().replace_all(&plain, "");
    plain.trim().to_string()
}

fn contains_any(line_lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| line_lower.contains(m))
}

/// Derive the narration script for an analysis.
///
/// The output is a single flat string of sentences joined by spaces, capped
/// at [`MAX_NARRATION_CHARS`]. Order follows the source text; nothing is
/// rephrased beyond markup stripping.
pub fn build_narration_script(analysis: &str, summary: StatusSummary) -> String {
    let plain = strip_markup(analysis);
    let lines: Vec<&str> = plain
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut parts: Vec<String> = vec![INTRO.to_string()];

    if summary.within_target > 0 || summary.needs_review > 0 {
        let mut counts = Vec::new();
        if summary.within_target > 0 {
            counts.push(format!(
                "{} of your labs are within the target range",
                summary.within_target
            ));
        }
        if summary.needs_review > 0 {
            counts.push(format!(
                "{} may need a closer look with your transplant team",
                summary.needs_review
            ));
        }
        parts.push(format!("{}.", counts.join(", and ")));
    }

    let mut key_findings: Vec<String> = Vec::new();
    let mut in_section = false;
    for line in &lines {
        let lower = line.to_lowercase();
        if contains_any(&lower, FINDING_MARKERS) {
            in_section = true;
            let cleaned = bullet_re().replace(line, "").to_string();
            if cleaned.chars().count() > 15 {
                key_findings.push(cleaned);
            }
            continue;
        }
        if in_section {
            if line.starts_with("##") || line.starts_with("Recommendation") {
                in_section = false;
                continue;
            }
            let cleaned = bullet_re().replace(line, "").to_string();
            if cleaned.chars().count() > 10 && key_findings.len() < MAX_KEY_FINDINGS {
                key_findings.push(cleaned);
            }
        }
    }

    if key_findings.is_empty() {
        key_findings = lines
            .iter()
            .filter(|l| l.starts_with('-') || l.starts_with('*') || l.starts_with('\u{2022}'))
            .map(|l| bullet_re().replace(l, "").to_string())
            .filter(|l| {
                let n = l.chars().count();
                n > 15 && n < 200
            })
            .take(MAX_FALLBACK_BULLETS)
            .collect();
    }

    if !key_findings.is_empty() {
        parts.push(KEY_POINTS_LEAD.to_string());
        parts.extend(key_findings);
    }

    let mut recommendations: Vec<String> = Vec::new();
    let mut in_recommendations = false;
    for line in &lines {
        let lower = line.to_lowercase();
        if contains_any(&lower, RECOMMENDATION_MARKERS) {
            in_recommendations = true;
            continue;
        }
        if in_recommendations {
            if line.starts_with("##") {
                break;
            }
            let cleaned = numbered_bullet_re().replace(line, "").to_string();
            if cleaned.chars().count() > 10 && recommendations.len() < MAX_RECOMMENDATIONS {
                recommendations.push(cleaned);
            }
        }
    }

    if !recommendations.is_empty() {
        parts.push(RECOMMENDATIONS_LEAD.to_string());
        parts.extend(recommendations);
    }

    parts.push(CLOSING.to_string());

    truncate_chars(&parts.join(" "), MAX_NARRATION_CHARS)
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
**Hi there! Let's look at your results together.**\n\
Your kidney numbers look steady this month.\n\
\n\
## Your Numbers at a Glance\n\
-> **Creatinine: 1.4 mg/dL**\n\
-> Your number is right in the transplant target range.\n\
\n\
## The Big Picture\n\
Overall, your graft is doing what we want it to do.\n\
Your electrolytes support that picture.\n\
\n\
## Personalized Recommendations\n\
- Keep drinking water through the day, especially in warm weather.\n\
- Keep your potassium intake moderate until the next check.\n\
\n\
## Taking Care of You\n\
You're doing a great job staying engaged with your health.";

    fn summary() -> StatusSummary {
        StatusSummary {
            within_target: 3,
            needs_review: 1,
        }
    }

    #[test]
    fn test_script_has_fixed_intro_and_closing() {
        let script = build_narration_script(SAMPLE, summary());
        assert!(script.starts_with(INTRO));
        assert!(script.ends_with(CLOSING));
    }

    #[test]
    fn test_script_summarizes_counts() {
        let script = build_narration_script(SAMPLE, summary());
        assert!(script.contains("3 of your labs are within the target range"));
        assert!(script.contains("1 may need a closer look with your transplant team"));
    }

    #[test]
    fn test_counts_sentence_omitted_when_no_labs() {
        let script = build_narration_script(SAMPLE, StatusSummary::default());
        assert!(!script.contains("within the target range,"));
    }

    #[test]
    fn test_collects_key_findings_after_marker() {
        let script = build_narration_script(SAMPLE, summary());
        assert!(script.contains(KEY_POINTS_LEAD));
        assert!(script.contains("Overall, your graft is doing what we want it to do."));
        assert!(script.contains("Your electrolytes support that picture."));
    }

    #[test]
    fn test_collects_recommendations() {
        let script = build_narration_script(SAMPLE, summary());
        assert!(script.contains(RECOMMENDATIONS_LEAD));
        assert!(script.contains("Keep drinking water through the day"));
    }

    #[test]
    fn test_markup_is_stripped() {
        let script = build_narration_script(SAMPLE, summary());
        assert!(!script.contains("**"));
        assert!(!script.contains("##"));
        assert!(!script.contains("->"));
    }

    #[test]
    fn test_falls_back_to_bullets_without_markers() {
        let text = "Here is what I can tell you.\n\
            - Your creatinine is steady compared to last month's value.\n\
            - Your potassium is a little higher than the usual target.\n";
        let script = build_narration_script(text, summary());
        assert!(script.contains(KEY_POINTS_LEAD));
        assert!(script.contains("Your creatinine is steady"));
    }

    #[test]
    fn test_degrades_to_intro_and_closing_only() {
        let script = build_narration_script("Fine.", StatusSummary::default());
        assert_eq!(script, format!("{INTRO} {CLOSING}"));
    }

    #[test]
    fn test_rerun_on_own_output_stays_capped() {
        // A pathological analysis long enough to hit the ceiling.
        let long = SAMPLE.repeat(60);
        let once = build_narration_script(&long, summary());
        assert!(once.chars().count() <= MAX_NARRATION_CHARS);
        let twice = build_narration_script(&once, summary());
        assert!(twice.chars().count() <= MAX_NARRATION_CHARS);
        let thrice = build_narration_script(&twice, summary());
        assert!(thrice.chars().count() <= MAX_NARRATION_CHARS);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 10), "ab");
        // Multi-byte chars must not split.
        assert_eq!(truncate_chars("\u{b5}\u{b5}\u{b5}", 2), "\u{b5}\u{b5}");
    }
}
