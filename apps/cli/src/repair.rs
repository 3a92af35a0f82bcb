//! Output Repair Engine. Decodes the generator's raw response into an
//! [`Adaptation`], falling back to two heuristic repair passes when the
//! primary decode fails.
//!
//! The passes fix the two failure modes LLMs actually produce here: raw
//! newlines/tabs inside JSON string values, and LaTeX commands whose single
//! backslashes were never doubled for JSON. Repair is idempotent on text
//! that already decodes.

use tracing::debug;

use crate::adapt::Adaptation;
use crate::errors::AppError;

/// How the response was decoded. `Repaired` means the primary decode failed
/// and the repaired text decoded instead; an unrecoverable response is the
/// `AppError::Decode` case.
#[derive(Debug)]
pub enum DecodeOutcome {
    Decoded(Adaptation),
    Repaired(Adaptation),
}

impl DecodeOutcome {
    pub fn into_adaptation(self) -> Adaptation {
        match self {
            DecodeOutcome::Decoded(adaptation) | DecodeOutcome::Repaired(adaptation) => adaptation,
        }
    }

    pub fn was_repaired(&self) -> bool {
        matches!(self, DecodeOutcome::Repaired(_))
    }
}

/// Decodes a raw generation response, stripping an optional markdown fence
/// first and repairing on a failed primary decode.
pub fn decode_adaptation(raw: &str) -> Result<DecodeOutcome, AppError> {
    let text = strip_json_fences(raw);

    let primary_error = match serde_json::from_str::<Adaptation>(text) {
        Ok(adaptation) => return Ok(DecodeOutcome::Decoded(adaptation)),
        Err(e) => e,
    };

    debug!("Primary decode failed ({primary_error}), attempting repair");
    let repaired = repair(text);
    match serde_json::from_str::<Adaptation>(&repaired) {
        Ok(adaptation) => Ok(DecodeOutcome::Repaired(adaptation)),
        Err(repaired_error) => Err(AppError::Decode(format!(
            "{repaired_error} (after repair; primary error: {primary_error})\n\
             Response was: {}\nRepaired to: {}",
            truncate(text, 300),
            truncate(&repaired, 300),
        ))),
    }
}

/// Normalizes likely-malformed JSON. Two independent passes, in order:
/// control-character escaping inside string literals, then re-escaping of
/// single backslashes that are not valid JSON escapes.
pub fn repair(text: &str) -> String {
    re_escape_backslashes(&escape_control_chars(text))
}

/// Rewrites raw newlines, carriage returns, and tabs inside JSON string
/// literals to their two-character escape forms. Tracks quote state with a
/// one-step escape flag so `\"` does not toggle it.
fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = !in_string;
                out.push(ch);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => out.push_str("\\r"),
            '\t' if in_string => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }

    out
}

/// Sentinel for already-doubled backslashes while single ones are rewritten.
const DOUBLE_BACKSLASH_SENTINEL: &str = "\u{1}DOUBLE_BACKSLASH\u{1}";

/// Doubles every single backslash that does not start a recognized JSON
/// escape, so LaTeX commands like `\skill` survive the decode. Backslashes
/// that are already doubled are protected first and restored unchanged.
fn re_escape_backslashes(text: &str) -> String {
    let protected = text.replace("\\\\", DOUBLE_BACKSLASH_SENTINEL);

    let mut out = String::with_capacity(protected.len());
    let mut chars = protected.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => out.push('\\'),
            // Unknown escape letter, or a backslash at end of input: literal.
            _ => out.push_str("\\\\"),
        }
    }

    out.replace(DOUBLE_BACKSLASH_SENTINEL, "\\\\")
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// First `max` characters, for diagnostics and log previews.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
