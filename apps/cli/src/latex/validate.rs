//! Structural Validator. Cheap checks first (brace balance, mandatory
//! commands), then an optional xelatex compile as a stronger oracle.
//!
//! The compile runs inside a `TempDir` so scratch files never outlive the
//! call, whatever the exit path. An absent xelatex binary degrades to the
//! structural checks with a warning instead of failing the run.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::latex::braces::{validate_braces, ValidationOutcome};

/// Structural landmarks that must survive substitution. Their disappearance
/// means the generator corrupted command syntax rather than content.
pub const REQUIRED_COMMANDS: &[&str] = &[
    "\\name{",
    "\\tagline{",
    "\\makeheader",
    "\\highlightbar{",
    "\\mainbar{",
];

/// Lines of compiler output attached to a failure diagnostic.
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// The external compiler used as the stronger oracle.
const XELATEX_PROGRAM: &str = "xelatex";

/// Checks the candidate document: full-document brace balance, then presence
/// of every mandatory command the original document had.
pub fn validate_structure(original: &str, candidate: &str) -> ValidationOutcome {
    let outcome = validate_braces(candidate, "adapted CV");
    if !outcome.is_valid() {
        return outcome;
    }

    for command in REQUIRED_COMMANDS {
        if original.contains(command) && !candidate.contains(command) {
            return ValidationOutcome::Invalid {
                reason: format!("Missing required command {command} in adapted CV"),
            };
        }
    }

    ValidationOutcome::Valid
}

/// Compiles the candidate with xelatex as a stronger correctness oracle.
///
/// Writes the candidate to a scratch directory, copies `.cls`/`.sty` files
/// from `style_dir` next to it, and runs `xelatex -no-pdf` with a hard
/// wall-clock bound. Returns `Invalid` with the trailing diagnostic lines on
/// a non-zero exit or timeout, and `Valid` when xelatex is not installed.
pub async fn compile_check(
    candidate: &str,
    style_dir: &Path,
    timeout: Duration,
) -> Result<ValidationOutcome, AppError> {
    compile_check_with(XELATEX_PROGRAM, candidate, style_dir, timeout).await
}

/// Implementation with the compiler program injectable, so tests can script
/// a missing binary or a slow fake.
async fn compile_check_with(
    program: &str,
    candidate: &str,
    style_dir: &Path,
    timeout: Duration,
) -> Result<ValidationOutcome, AppError> {
    let scratch = tempfile::tempdir()?;
    let tex_path = scratch.path().join("candidate.tex");
    tokio::fs::write(&tex_path, candidate).await?;

    copy_style_files(style_dir, scratch.path()).await;

    let mut command = Command::new(program);
    command
        .args([
            "-interaction=nonstopmode",
            "-halt-on-error",
            "-no-pdf",
            "candidate.tex",
        ])
        .current_dir(scratch.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("{program} not available, skipping compilation check");
            return Ok(ValidationOutcome::Valid);
        }
        Err(e) => return Err(e.into()),
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            // kill_on_drop reaps the abandoned xelatex process.
            return Ok(ValidationOutcome::Invalid {
                reason: "LaTeX compilation timed out".to_string(),
            });
        }
    };

    if output.status.success() {
        debug!("xelatex accepted the candidate document");
        return Ok(ValidationOutcome::Valid);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(ValidationOutcome::Invalid {
        reason: format!(
            "LaTeX compilation failed:\n{}",
            tail_lines(&stdout, DIAGNOSTIC_TAIL_LINES)
        ),
    })
}

/// Copies class and style files into the scratch dir. Per-file failures are
/// non-fatal; the compile simply sees fewer resources.
async fn copy_style_files(style_dir: &Path, scratch: &Path) {
    let mut entries = match tokio::fs::read_dir(style_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Style directory {} unreadable: {e}", style_dir.display());
            return;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to list style directory: {e}");
                break;
            }
        };
        let path = entry.path();
        let is_style = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("cls") | Some("sty")
        );
        if !is_style {
            continue;
        }
        if let Err(e) = tokio::fs::copy(&path, scratch.join(entry.file_name())).await {
            warn!("Could not copy style file {}: {e}", path.display());
        }
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
