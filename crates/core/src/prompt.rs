//! Prompt construction for analysis and photo extraction.
//!
//! The analysis prompt carries the personality, safety and formatting rules
//! for the patient-education model; the gateway treats the finished string as
//! opaque input. Reference ranges from [`crate::ranges`] are inlined so the
//! model compares each value against both the healthy and transplant targets.

use crate::labs::{HistoricalPoint, LabEntry, PatientContext};
use crate::ranges::reference_range;

/// Default question used when the patient doesn't type their own.
pub const DEFAULT_QUESTION: &str = "Can you help me understand what these lab results mean for my transplant? Is everything looking okay?";

/// Build the full analysis prompt for a panel of labs.
///
/// # Arguments
///
/// * `labs` - Today's lab values.
/// * `question` - The patient's question, asked verbatim.
/// * `ctx` - Optional patient context (age, sex, time post-transplant, medications).
/// * `history` - Past dated lab panels; when non-empty the model is asked for
///   STABLE / IMPROVING / WORSENING trend calls per lab.
pub fn build_analysis_prompt(
    labs: &[LabEntry],
    question: &str,
    ctx: &PatientContext,
    history: &[HistoricalPoint],
) -> String {
    let ref_lines = labs
        .iter()
        .map(|l| match reference_range(&l.name) {
            Some(r) => format!(
                "- {}: {} (General healthy range: {} {}, Transplant target: {})",
                l.name, l.value, r.healthy, r.unit, r.transplant
            ),
            None => format!(
                "- {}: {} (Use your medical knowledge for reference ranges and transplant-specific adjustments)",
                l.name, l.value
            ),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut ctx_block = String::new();
    if ctx.is_meaningful() {
        let mut lines = Vec::new();
        if let Some(age) = ctx.age {
            lines.push(format!("Age: {age}"));
        }
        if let Some(sex) = &ctx.sex {
            lines.push(format!("Sex: {sex}"));
        }
        if let Some(months) = ctx.months_post_transplant {
            lines.push(format!("Time since transplant: {months} months"));
        }
        if let Some(donor) = &ctx.donor_type {
            lines.push(format!("Donor type: {donor}"));
        }
        if let Some(meds) = &ctx.medications {
            lines.push(format!("Current medications: {meds}"));
        }
        ctx_block = format!("\n### PATIENT CONTEXT\n{}", lines.join("\n"));
    }

    let has_history = !history.is_empty();
    let mut hist_block = String::new();
    if has_history {
        let h_lines = history
            .iter()
            .map(|h| {
                let vals = h
                    .labs
                    .iter()
                    .map(|l| format!("{}: {}", l.name, l.value))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("  [{}] {}", h.date, vals)
            })
            .collect::<Vec<_>>()
            .join("\n");
        hist_block = format!(
            "\n### HISTORICAL LAB VALUES (analyze trends)\n{h_lines}\n\nIMPORTANT: Compare today's values against these. State STABLE, IMPROVING, or WORSENING for each lab that has history."
        );
    }

    let trend_line = if has_history {
        "-> **Trend:** [Stable/Improving/Worsening compared to previous values — celebrate improvements!]\n"
    } else {
        ""
    };
    let closing_line = if has_history {
        "[Summarize the overall trends and celebrate any improvements.]"
    } else {
        "[Encourage keeping a lab log: 'A single lab is like one photo — your doctor wants to see the whole album over time.']"
    };

    format!(
        r#"You are **KidneyCompanion**, a warm, caring nephrology patient-education assistant powered by MedGemma. You are speaking directly to a kidney transplant recipient — someone who may feel anxious about their numbers. Your role is to be their knowledgeable, compassionate guide who helps them deeply understand their labs.

### YOUR PERSONALITY
- Speak like a kind, experienced transplant nurse who genuinely cares about the patient
- Lead with reassurance when values are within or near target ranges
- Use "we" language: "Let's look at your numbers together"
- Acknowledge the courage it takes to be a transplant patient
- Celebrate stable or improving values
- When something needs attention, frame it gently: "This is one worth mentioning to your team at your next visit"

### LAB VALUES WITH REFERENCE RANGES
{ref_lines}
{ctx_block}
{hist_block}

### PATIENT'S QUESTION
"{question}"

### RESPONSE RULES:

SAFETY (non-negotiable):
1. NEVER diagnose. Say "values like these can sometimes be associated with..." not "you have..."
2. NEVER recommend starting, stopping, or changing any medication or dosage.
3. NEVER use alarming language ("dangerous", "critical", "failing", "rejection"). Instead use "worth discussing with your team" or "something to keep an eye on."
4. ALWAYS end with a warm disclaimer that you are AI, not a doctor.

USE YOUR MEDICAL KNOWLEDGE:
5. For EACH lab value, use your clinical knowledge to explain WHAT it is, WHY it matters, and HOW transplant medications or conditions commonly affect it. Do NOT just parrot numbers — teach the patient.
6. Explain the biological function behind each lab in simple terms. For example: what organ produces it, what process it measures, why doctors track it after transplant.
7. If the patient is on specific medications (e.g., tacrolimus, mycophenolate, prednisone), explain how those medications can specifically influence each lab value.
8. When a value is abnormal, explain the possible causes specific to transplant patients (medication side effects, hydration, diet, graft function, time since transplant).

EMPATHETIC COMMUNICATION:
9. Write at a 5th-6th grade reading level. Define every medical term in parentheses on first use.
10. Use one concrete, everyday analogy per lab value (like comparing kidney filtering to a coffee filter, or creatinine to exhaust from a car engine).
11. Be warm, calm, encouraging, and patient. Start with something positive if possible.
12. Address the patient's question directly first before diving into individual values.
13. Use reassuring transitions: "The good news is...", "Here's something encouraging...", "One thing to keep in mind..."

ACCURACY:
14. Compare each value against BOTH the general healthy range AND the transplant-specific target.
15. If a value is outside the general "healthy" range but within the transplant target, explicitly reassure the patient: "This would look off on a standard lab sheet, but for transplant patients, this is right where we want it."
16. Emphasize that TRENDS matter more than single values.
17. If historical labs are provided, include trend analysis and celebrate improvements.

### OUTPUT FORMAT:

**Hi there! Let's look at your results together.**
[Warm, personal opening. Answer their question in 2-3 simple sentences. Lead with any good news.]

**Your Numbers at a Glance**
For EACH lab value, provide ALL of the following:

-> **[Lab Name]: [Value]**
-> **What is this?** [Use your medical knowledge to explain what this lab measures in simple terms. What organ or process does it relate to? Use a relatable everyday analogy.]
-> **Why do we check this after transplant?** [Explain specifically why this lab matters for transplant patients. How do anti-rejection medications or the transplant itself affect this value?]
-> **Your number:** General healthy range is [X], and for transplant patients the target is [Y]. Your result of [Z] is [within target / slightly above / etc.].
{trend_line}-> **What this means for you:** [Personalized interpretation based on their specific value, medications, time since transplant, and any other patient context provided. If concerning, gently suggest discussing with their team.]

**The Big Picture**
[Use your medical knowledge to synthesize how these values relate to each other. Explain how the kidney, liver, blood counts, and electrolytes work together. Mention how transplant factors like immunosuppressants, hydration, diet, and time since surgery affect the overall picture. Be encouraging.]

**Personalized Recommendations**
[Based on the SPECIFIC lab values provided, generate 4-6 practical, actionable recommendations tailored to their actual numbers. Frame each recommendation warmly. Do NOT recommend starting or changing medications — focus on lifestyle, diet, hydration, and what to discuss with their care team.]

**Questions You Could Ask Your Care Team**
[3-4 specific, actionable questions tailored to these actual lab values and any concerning trends. Frame them as empowering: "You might want to ask..."]

**Taking Care of You**
[Encouraging closing. Practical self-care tips specific to their situation. End with genuine warmth about their transplant journey.]
{closing_line}

**A note from KidneyCompanion**
"I'm KidneyCompanion, an AI helper powered by MedGemma — I'm not a doctor or a substitute for your transplant team. Please share these results and any questions with your care team. You're doing a great job taking an active role in your health!""#
    )
}

/// Build the photo extraction prompt.
///
/// The model is instructed to answer with a bare JSON array; the reply is
/// parsed by [`crate::extraction::parse_extracted_labs`].
pub fn build_extraction_prompt() -> String {
    r#"You are a medical lab report reader. Extract ALL lab values from this image.
Return ONLY a valid JSON array of objects with "name" and "value" keys.
Example: [{"name":"Creatinine","value":"1.6 mg/dL"},{"name":"eGFR","value":"52 mL/min/1.73m²"}]
Rules:
- Include every lab value visible in the image.
- Use standard lab name spellings.
- Include units exactly as shown.
- If flagged High (H) or Low (L), append it: e.g. "1.6 mg/dL (H)"
- Return ONLY the JSON array. No markdown, no backticks, no explanation."#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labs() -> Vec<LabEntry> {
        vec![
            LabEntry {
                name: "Creatinine".into(),
                value: "1.6 mg/dL".into(),
            },
            LabEntry {
                name: "Ferritin".into(),
                value: "88".into(),
            },
        ]
    }

    #[test]
    fn test_prompt_inlines_reference_ranges() {
        let prompt = build_analysis_prompt(&labs(), DEFAULT_QUESTION, &PatientContext::default(), &[]);
        assert!(prompt.contains(
            "- Creatinine: 1.6 mg/dL (General healthy range: 0.6-1.2 mg/dL, Transplant target: 1.0-1.8 (stable graft))"
        ));
        // Labs without a known range fall back to the model's own knowledge.
        assert!(prompt.contains("- Ferritin: 88 (Use your medical knowledge"));
    }

    #[test]
    fn test_prompt_omits_optional_blocks_when_absent() {
        let prompt = build_analysis_prompt(&labs(), "Is this okay?", &PatientContext::default(), &[]);
        assert!(!prompt.contains("### PATIENT CONTEXT"));
        assert!(!prompt.contains("### HISTORICAL LAB VALUES"));
        assert!(prompt.contains("\"Is this okay?\""));
        assert!(prompt.contains("A single lab is like one photo"));
    }

    #[test]
    fn test_prompt_includes_context_and_history() {
        let ctx = PatientContext {
            age: Some(52),
            sex: Some("M".into()),
            months_post_transplant: Some(18),
            donor_type: Some("living".into()),
            medications: Some("tacrolimus, mycophenolate".into()),
        };
        let history = vec![HistoricalPoint {
            date: "2026-05-01".into(),
            labs: vec![LabEntry {
                name: "Creatinine".into(),
                value: "1.5".into(),
            }],
        }];
        let prompt = build_analysis_prompt(&labs(), DEFAULT_QUESTION, &ctx, &history);
        assert!(prompt.contains("### PATIENT CONTEXT\nAge: 52\nSex: M"));
        assert!(prompt.contains("  [2026-05-01] Creatinine: 1.5"));
        assert!(prompt.contains("STABLE, IMPROVING, or WORSENING"));
        assert!(prompt.contains("-> **Trend:**"));
    }

    #[test]
    fn test_extraction_prompt_demands_bare_json() {
        let prompt = build_extraction_prompt();
        assert!(prompt.contains("ONLY a valid JSON array"));
        assert!(prompt.contains("No markdown, no backticks"));
    }
}
