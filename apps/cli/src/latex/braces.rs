//! Brace Balance Validator. Escape-aware linear scan over a span of LaTeX.

/// Outcome of a structural check. `Invalid` always carries a human-readable
/// reason naming the offending region or position when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid { reason: String },
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

/// Checks that `{`/`}` nesting in `text` is balanced, ignoring escaped braces
/// (`\{` and `\}`). `label` names the span for error messages.
///
/// Runs in one pass. A backslash escapes exactly the next character, so
/// `\\}` counts the `}` as structural (the first backslash escapes the
/// second). A trailing backslash with nothing after it is literal content.
pub fn validate_braces(text: &str, label: &str) -> ValidationOutcome {
    let mut depth: i64 = 0;
    let mut escaped = false;

    for (pos, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return ValidationOutcome::Invalid {
                        reason: format!("Unmatched closing brace in {label} at position {pos}"),
                    };
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        return ValidationOutcome::Invalid {
            reason: format!("Unmatched opening braces in {label} (depth: {depth})"),
        };
    }

    ValidationOutcome::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_nested_braces() {
        assert_eq!(validate_braces("{a{b}c}", "test"), ValidationOutcome::Valid);
    }

    #[test]
    fn test_unmatched_opening_brace_reports_depth() {
        match validate_braces("{a{b}c", "mainbar") {
            ValidationOutcome::Invalid { reason } => {
                assert!(reason.contains("mainbar"));
                assert!(reason.contains("depth: 1"));
            }
            ValidationOutcome::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_unmatched_closing_brace_reports_position() {
        match validate_braces("a}b", "test") {
            ValidationOutcome::Invalid { reason } => {
                assert!(reason.contains("position 1"));
            }
            ValidationOutcome::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        assert_eq!(validate_braces("\\{\\}", "test"), ValidationOutcome::Valid);
        assert_eq!(
            validate_braces("\\{only escaped open", "test"),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn test_double_backslash_does_not_escape_brace() {
        // \\ is a LaTeX line break; the following brace is structural.
        match validate_braces("\\\\}", "test") {
            ValidationOutcome::Invalid { reason } => assert!(reason.contains("position 2")),
            ValidationOutcome::Valid => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_trailing_backslash_is_literal() {
        assert_eq!(validate_braces("{a}\\", "test"), ValidationOutcome::Valid);
    }

    #[test]
    fn test_latex_command_content() {
        assert_eq!(
            validate_braces("\\textbf{Rust} and \\emph{Tokio}", "test"),
            ValidationOutcome::Valid
        );
    }
}
