//! Adaptation Orchestrator. Drives one CV adaptation run:
//! extract regions → generate → decode/repair → substitute → validate,
//! with one corrective retry when validation rejects the candidate.
//!
//! The generator is an explicit [`AdaptationGenerator`] handle, never ambient
//! state, so tests script it and production passes the real `LlmClient`.

pub mod prompts;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adapt::prompts::{build_adaptation_prompt, build_correction_prompt, ADAPTATION_SYSTEM};
use crate::errors::AppError;
use crate::latex::braces::ValidationOutcome;
use crate::latex::regions::extract_regions;
use crate::latex::substitute::apply_adaptation;
use crate::latex::validate::{compile_check, validate_structure};
use crate::llm_client::AdaptationGenerator;
use crate::repair::decode_adaptation;

/// Corrective attempts after the first generation. Unbounded retries against
/// an external generator are disallowed to cap cost and latency.
const MAX_CORRECTION_ATTEMPTS: u32 = 1;

/// The generator's proposed replacement per region, untrusted until the
/// candidate document passes structural validation. A `None` field leaves
/// that region of the CV unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adaptation {
    pub tagline: Option<String>,
    pub highlightbar: Option<String>,
    pub mainbar: Option<String>,
    pub experiences: Option<String>,
    pub general_skills: Option<String>,
    /// Free-text summary of the changes, surfaced to the user.
    pub explanation: Option<String>,
}

/// Validation knobs for one run.
#[derive(Debug, Clone)]
pub struct AdaptOptions {
    /// Directory holding `.cls`/`.sty` resources for the compile oracle.
    pub style_dir: PathBuf,
    /// Wall-clock bound on one xelatex invocation.
    pub compile_timeout: Duration,
    /// Skip the compile oracle and rely on the structural checks alone.
    pub skip_compile: bool,
}

/// Retry bookkeeping across generation attempts: how many corrections were
/// spent and what the last rejection looked like.
struct RetryState {
    corrections_used: u32,
    last_failure: Option<CorrectiveFeedback>,
}

/// The bundle sent back to the generator after a rejected candidate.
struct CorrectiveFeedback {
    previous_response: String,
    failure_reason: String,
}

/// Runs the full adaptation pipeline and returns the validated candidate
/// document. Never writes output itself; the caller persists the result
/// only on success.
pub async fn adapt_cv(
    generator: &dyn AdaptationGenerator,
    original_cv: &str,
    job_description: &str,
    options: &AdaptOptions,
) -> Result<String, AppError> {
    info!("Extracting CV regions...");
    let regions = extract_regions(original_cv);
    if regions.is_empty() {
        warn!("No editable regions found; the adaptation prompt will be degraded");
    }
    let base_prompt = build_adaptation_prompt(&regions, job_description);

    let mut retry = RetryState {
        corrections_used: 0,
        last_failure: None,
    };

    loop {
        let prompt = match &retry.last_failure {
            None => base_prompt.clone(),
            Some(feedback) => build_correction_prompt(
                &base_prompt,
                &feedback.previous_response,
                &feedback.failure_reason,
            ),
        };

        info!("Requesting adaptation from the generation service...");
        let raw = generator.generate(ADAPTATION_SYSTEM, &prompt).await?;

        let decoded = decode_adaptation(&raw)?;
        if decoded.was_repaired() {
            warn!("Generator response needed repair before it decoded");
        }
        let adaptation = decoded.into_adaptation();

        if let Some(explanation) = &adaptation.explanation {
            info!("Changes made: {explanation}");
        }

        info!("Applying adaptations to the CV...");
        let substituted = apply_adaptation(original_cv, &adaptation);

        // Per-region brace faults first: a whole-document scan cannot see
        // imbalances that compensate across regions.
        let mut verdict = substituted.verdict();
        if verdict.is_valid() {
            verdict = validate_structure(original_cv, &substituted.document);
        }
        if verdict.is_valid() && !options.skip_compile {
            info!("Compiling LaTeX to validate structure...");
            verdict = compile_check(
                &substituted.document,
                &options.style_dir,
                options.compile_timeout,
            )
            .await?;
        }

        match verdict {
            ValidationOutcome::Valid => {
                info!("Candidate CV passed structural validation");
                return Ok(substituted.document);
            }
            ValidationOutcome::Invalid { reason } => {
                if retry.corrections_used >= MAX_CORRECTION_ATTEMPTS {
                    return Err(AppError::Structural(format!(
                        "{reason} (after {} corrective attempt(s))",
                        retry.corrections_used
                    )));
                }
                warn!("Validation failed, requesting a corrective attempt: {reason}");
                retry.corrections_used += 1;
                retry.last_failure = Some(CorrectiveFeedback {
                    previous_response: serde_json::to_string_pretty(&adaptation)?,
                    failure_reason: reason,
                });
            }
        }
    }
}
