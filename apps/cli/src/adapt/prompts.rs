// All LLM prompt constants for the adaptation pipeline.
// Templates use {placeholder} markers filled by the build_* helpers.

use crate::latex::regions::{prompt_field, CvRegions};

/// System prompt for CV adaptation. Enforces grounding and JSON-only output.
pub const ADAPTATION_SYSTEM: &str = "You are a professional CV optimization expert. \
    You adapt a CV to match a specific job description while staying \
    COMPLETELY GROUNDED on the existing content. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Adaptation prompt template. Placeholders: the five region names plus
/// `{job_description}`.
pub const ADAPTATION_PROMPT_TEMPLATE: &str = r#"Adapt the CV sections below to the job description.

STRICT RULES:
1. DO NOT invent or add any skills, experiences, or qualifications that are not already in the CV
2. DO NOT exaggerate or lie about capabilities
3. ONLY reformulate, reorder, and highlight existing content to better match the job description
4. Keep the LaTeX formatting intact, with braces balanced in every section
5. Maintain professional tone and clarity

ORIGINAL CV SECTIONS:
---
Tagline:
{tagline}

Work History:
{mainbar}

Detailed Experiences:
{experiences}

General Skills:
{general_skills}

Skills Sidebar:
{highlightbar}
---

JOB DESCRIPTION:
---
{job_description}
---

TASK:
Analyze the job description and adapt the CV sections to better match it. Focus on:
1. Rewriting the tagline to highlight the most relevant experience for this role
2. Reordering or emphasizing work experiences that match the job requirements
3. Reformulating experience descriptions to use keywords from the job description
4. Highlighting relevant skills that match the job
5. Adjusting the general skills tags to prioritize relevant technologies

Return ONLY a JSON object with this EXACT structure:
{
    "tagline": "adapted tagline here",
    "mainbar": "adapted mainbar section here",
    "experiences": "adapted experiences section here",
    "general_skills": "adapted general skills section here",
    "highlightbar": "adapted highlightbar section here",
    "explanation": "Brief explanation of changes made"
}

Make sure all LaTeX formatting is preserved exactly as in the original."#;

/// Corrective-feedback template sent on a retry. Placeholders:
/// `{failure_reason}` and `{previous_response}`; the original adaptation
/// prompt is appended so the model keeps the full task context.
pub const CORRECTION_PREAMBLE_TEMPLATE: &str = r#"Your previous adaptation was rejected because it broke the document structure:

{failure_reason}

Your previous response was:
{previous_response}

Produce a corrected adaptation. Keep every brace balanced and every LaTeX command intact. The original task follows.

"#;

/// Fills the adaptation template with the extracted regions and the job
/// description. Absent regions are rendered as "N/A".
pub fn build_adaptation_prompt(regions: &CvRegions, job_description: &str) -> String {
    fill_template(
        ADAPTATION_PROMPT_TEMPLATE,
        &[
            ("tagline", prompt_field(&regions.tagline)),
            ("mainbar", prompt_field(&regions.mainbar)),
            ("experiences", prompt_field(&regions.experiences)),
            ("general_skills", prompt_field(&regions.general_skills)),
            ("highlightbar", prompt_field(&regions.highlightbar)),
            ("job_description", job_description),
        ],
    )
}

/// Prepends the corrective feedback to the original prompt.
pub fn build_correction_prompt(
    base_prompt: &str,
    previous_response: &str,
    failure_reason: &str,
) -> String {
    let preamble = fill_template(
        CORRECTION_PREAMBLE_TEMPLATE,
        &[
            ("failure_reason", failure_reason),
            ("previous_response", previous_response),
        ],
    );
    format!("{preamble}{base_prompt}")
}

/// Fills `{name}` markers in a single pass over the template. Inserted
/// values are never rescanned, so marker-like text inside CV content or
/// feedback cannot itself be substituted.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let markers: Vec<(String, &str)> = values
        .iter()
        .map(|(name, value)| (format!("{{{name}}}"), *value))
        .collect();

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = markers
            .iter()
            .filter_map(|(marker, value)| {
                rest.find(marker.as_str())
                    .map(|idx| (idx, marker.len(), *value))
            })
            .min_by_key(|&(idx, _, _)| idx);
        match next {
            Some((idx, marker_len, value)) => {
                out.push_str(&rest[..idx]);
                out.push_str(value);
                rest = &rest[idx + marker_len..];
            }
            None => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_regions_and_job() {
        let regions = CvRegions {
            tagline: Some("Engineer".to_string()),
            ..CvRegions::default()
        };
        let prompt = build_adaptation_prompt(&regions, "Rust backend role");
        assert!(prompt.contains("Tagline:\nEngineer"));
        assert!(prompt.contains("Rust backend role"));
        // Absent regions degrade to N/A rather than failing.
        assert!(prompt.contains("Work History:\nN/A"));
    }

    #[test]
    fn test_marker_text_inside_region_content_is_not_expanded() {
        let regions = CvRegions {
            tagline: Some("mentions {job_description} literally".to_string()),
            ..CvRegions::default()
        };
        let prompt = build_adaptation_prompt(&regions, "SECRET-JD");
        assert!(prompt.contains("mentions {job_description} literally"));
        // The real slot is still filled, exactly once.
        assert_eq!(prompt.matches("SECRET-JD").count(), 1);
    }

    #[test]
    fn test_correction_prompt_carries_feedback_and_task() {
        let base = build_adaptation_prompt(&CvRegions::default(), "some role");
        let prompt = build_correction_prompt(&base, "{\"mainbar\": \"{\"}", "Unmatched opening braces");
        assert!(prompt.contains("Unmatched opening braces"));
        assert!(prompt.contains("{\"mainbar\": \"{\"}"));
        assert!(prompt.contains("JOB DESCRIPTION"));
    }
}
