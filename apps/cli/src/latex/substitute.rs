//! Region Substitution Engine. Splices adapted content back between the
//! anchor pairs the extractor used, leaving the anchors untouched.
//!
//! Replacement is a byte-range splice, never a pattern substitution: the
//! adapted text is untrusted free text and may contain characters that a
//! pattern engine would interpret (`$1`, `\1`, braces). It is inserted
//! verbatim apart from a mandatory trim of leading/trailing whitespace.

use tracing::warn;

use crate::adapt::Adaptation;
use crate::latex::braces::{validate_braces, ValidationOutcome};
use crate::latex::regions::{
    locate_interior, AnchorSpec, EXPERIENCES, GENERAL_SKILLS, HIGHLIGHTBAR, MAINBAR, TAGLINE,
};
use crate::repair::truncate;

/// Result of applying an adaptation: the updated document plus the brace
/// faults of every region that was spliced in.
///
/// A whole-document brace scan cannot see imbalances that compensate across
/// regions, so each substituted region's own depth must return to zero.
/// The faults are carried here rather than failing the substitution because
/// substitution stays best-effort per region; the orchestrator folds them
/// into the validation verdict.
#[derive(Debug)]
pub struct SubstitutedCv {
    pub document: String,
    pub region_faults: Vec<String>,
}

impl SubstitutedCv {
    /// Verdict over the per-region brace checks alone.
    pub fn verdict(&self) -> ValidationOutcome {
        match self.region_faults.first() {
            None => ValidationOutcome::Valid,
            Some(reason) => ValidationOutcome::Invalid {
                reason: reason.clone(),
            },
        }
    }
}

/// Applies every region present in `adaptation` to `original`. Regions
/// absent from the adaptation are left unchanged; anchors missing from the
/// document skip that one substitution.
pub fn apply_adaptation(original: &str, adaptation: &Adaptation) -> SubstitutedCv {
    let mut document = original.to_string();
    let mut region_faults = Vec::new();

    if let Some(tagline) = &adaptation.tagline {
        let content = strip_tagline_wrapper(tagline.trim());
        substitute_region(&mut document, &TAGLINE, content, &mut region_faults);
    }
    if let Some(highlightbar) = &adaptation.highlightbar {
        substitute_region(&mut document, &HIGHLIGHTBAR, highlightbar.trim(), &mut region_faults);
    }
    if let Some(mainbar) = &adaptation.mainbar {
        substitute_region(&mut document, &MAINBAR, mainbar.trim(), &mut region_faults);
    }
    if let Some(experiences) = &adaptation.experiences {
        substitute_region(&mut document, &EXPERIENCES, experiences.trim(), &mut region_faults);
    }
    if let Some(general_skills) = &adaptation.general_skills {
        substitute_region(&mut document, &GENERAL_SKILLS, general_skills.trim(), &mut region_faults);
    }

    SubstitutedCv {
        document,
        region_faults,
    }
}

/// Replaces the interior of one region in place. Best-effort: a missing
/// anchor pair logs a warning and leaves the document as-is. Unbalanced
/// content is still spliced (so corrective feedback can quote it) but its
/// fault is recorded for the verdict.
fn substitute_region(
    document: &mut String,
    spec: &AnchorSpec,
    content: &str,
    faults: &mut Vec<String>,
) {
    let (start, end) = match locate_interior(document, spec) {
        Some(range) => range,
        None => {
            warn!(
                "Anchors for region '{}' not found in document, skipping substitution",
                spec.name
            );
            return;
        }
    };

    if let ValidationOutcome::Invalid { reason } = validate_braces(content, spec.name) {
        warn!("{reason}");
        warn!("Content preview: {}", truncate(content, 100));
        faults.push(reason);
    }

    document.replace_range(start..end, content);
}

/// Drops a `\tagline{...}` wrapper the generator sometimes adds around the
/// tagline value instead of returning the bare content.
fn strip_tagline_wrapper(content: &str) -> &str {
    content
        .strip_prefix("\\tagline{")
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latex::regions::{extract_region, extract_regions};

    const SAMPLE_CV: &str = "\\documentclass{simplecv}\n\
\\name{Ada Lovelace}\n\
\\tagline{Engineer}\n\
\\makeheader{0.8}\n\
\\highlightbar{\n  \\skill{Rust}{5}\n}\n\
\\mainbar{X}\\makebody\n\
\\section{Experiences description}\nBuilt the engine.\n\\makebody\n\
\\section{General Skills}\n\\tag{Rust}\n\\section{Wheel Chart}\n";

    fn adaptation_with_mainbar(value: &str) -> Adaptation {
        Adaptation {
            mainbar: Some(value.to_string()),
            ..Adaptation::default()
        }
    }

    #[test]
    fn test_substitution_preserves_anchors() {
        let adaptation = Adaptation {
            tagline: Some("Senior Engineer".to_string()),
            mainbar: Some("Y".to_string()),
            ..Adaptation::default()
        };
        let updated = apply_adaptation(SAMPLE_CV, &adaptation).document;
        assert!(updated.contains("\\tagline{Senior Engineer}"));
        assert!(updated.contains("\\mainbar{Y}\\makebody"));
        // Untouched regions survive byte-for-byte.
        assert!(updated.contains("\\highlightbar{\n  \\skill{Rust}{5}\n}"));
        assert!(updated.contains("\\name{Ada Lovelace}"));
    }

    #[test]
    fn test_replacement_text_is_never_a_pattern() {
        // $1, \1 and stray anchors must land verbatim, not as back-references.
        let adaptation = adaptation_with_mainbar("worth $1M, see \\1 and $x^2$");
        let updated = apply_adaptation(SAMPLE_CV, &adaptation).document;
        let reread = extract_region(&updated, &MAINBAR);
        assert_eq!(reread.as_deref(), Some("worth $1M, see \\1 and $x^2$"));
    }

    #[test]
    fn test_roundtrip_yields_trimmed_replacement() {
        let adaptation = adaptation_with_mainbar("  \\experience{Lead}{Acme}  \n");
        let updated = apply_adaptation(SAMPLE_CV, &adaptation).document;
        let reread = extract_region(&updated, &MAINBAR);
        assert_eq!(reread.as_deref(), Some("\\experience{Lead}{Acme}"));
    }

    #[test]
    fn test_absent_adaptation_region_is_noop() {
        let updated = apply_adaptation(SAMPLE_CV, &Adaptation::default()).document;
        assert_eq!(updated, SAMPLE_CV);
    }

    #[test]
    fn test_missing_anchor_skips_that_region() {
        let doc = "\\tagline{Engineer}\nno mainbar here";
        let adaptation = Adaptation {
            tagline: Some("Builder".to_string()),
            mainbar: Some("ignored".to_string()),
            ..Adaptation::default()
        };
        let updated = apply_adaptation(doc, &adaptation).document;
        assert_eq!(updated, "\\tagline{Builder}\nno mainbar here");
    }

    #[test]
    fn test_tagline_wrapper_is_stripped() {
        let adaptation = Adaptation {
            tagline: Some("\\tagline{Senior Engineer}".to_string()),
            ..Adaptation::default()
        };
        let updated = apply_adaptation(SAMPLE_CV, &adaptation).document;
        assert!(updated.contains("\\tagline{Senior Engineer}"));
        assert!(!updated.contains("\\tagline{\\tagline{"));
    }

    #[test]
    fn test_compensating_imbalance_across_regions_is_flagged() {
        // One region opens a brace, another closes one: the whole document
        // still balances, but each region's own depth must return to zero.
        let adaptation = Adaptation {
            mainbar: Some("{".to_string()),
            experiences: Some("}".to_string()),
            ..Adaptation::default()
        };
        let result = apply_adaptation(SAMPLE_CV, &adaptation);
        assert!(validate_braces(&result.document, "candidate").is_valid());
        match result.verdict() {
            ValidationOutcome::Invalid { reason } => {
                assert!(reason.contains("mainbar"));
            }
            ValidationOutcome::Valid => panic!("expected per-region fault"),
        }
        assert_eq!(result.region_faults.len(), 2);
    }

    #[test]
    fn test_balanced_substitution_has_no_faults() {
        let result = apply_adaptation(SAMPLE_CV, &adaptation_with_mainbar("\\textbf{Y}"));
        assert!(result.region_faults.is_empty());
        assert!(result.verdict().is_valid());
    }

    #[test]
    fn test_unbalanced_content_for_absent_region_is_not_a_fault() {
        let doc = "\\tagline{Engineer}\nno mainbar here";
        let result = apply_adaptation(doc, &adaptation_with_mainbar("{"));
        assert_eq!(result.document, doc);
        assert!(result.verdict().is_valid());
    }

    #[test]
    fn test_all_regions_substituted() {
        let adaptation = Adaptation {
            tagline: Some("Senior Engineer".to_string()),
            highlightbar: Some("\\skill{Rust}{5}\n  \\skill{Async}{4}".to_string()),
            mainbar: Some("\\experience{Lead}{Acme}".to_string()),
            experiences: Some("Led the rewrite.".to_string()),
            general_skills: Some("\\tag{Rust} \\tag{Tokio}".to_string()),
            explanation: Some("reworded".to_string()),
        };
        let updated = apply_adaptation(SAMPLE_CV, &adaptation).document;
        let regions = extract_regions(&updated);
        assert_eq!(regions.tagline.as_deref(), Some("Senior Engineer"));
        assert_eq!(
            regions.highlightbar.as_deref(),
            Some("\\skill{Rust}{5}\n  \\skill{Async}{4}")
        );
        assert_eq!(regions.mainbar.as_deref(), Some("\\experience{Lead}{Acme}"));
        assert_eq!(regions.experiences.as_deref(), Some("Led the rewrite."));
        assert_eq!(
            regions.general_skills.as_deref(),
            Some("\\tag{Rust} \\tag{Tokio}")
        );
    }
}
