//! Human-facing diagnostics
//!
//! A [`Diagnostic`] is the presentation form of a [`TuffError`]: it fills in
//! the source excerpt, a reason and a suggested fix so every failure reads the
//! same way in a terminal, in an editor, or as JSON.

use crate::ast::Loc;
use crate::error::{ErrorCode, TuffError};
use colored::Colorize;
use serde::{Deserialize, Serialize};

const DEFAULT_REASON: &str =
    "This violates the language rules or safety guarantees enforced by the compiler.";
const DEFAULT_FIX: &str =
    "Update the code near this location so it satisfies the expected syntax, typing, and safety constraints.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
    /// Excerpt of the offending source, or a placeholder when unavailable.
    pub source: String,
    pub reason: String,
    pub fix: String,
}

impl Diagnostic {
    /// Build a diagnostic, deriving an excerpt from `source` when the error
    /// does not already carry one.
    pub fn from_error(err: &TuffError, source: Option<&str>) -> Self {
        let excerpt = err.excerpt.clone().or_else(|| {
            let loc = err.loc.as_ref()?;
            crate::error::source_excerpt(source?, loc)
        });

        Self {
            code: err.code,
            message: err.message.clone(),
            loc: err.loc.clone(),
            source: excerpt.unwrap_or_else(|| "<source unavailable>".to_string()),
            reason: err.details.clone().unwrap_or_else(|| DEFAULT_REASON.to_string()),
            fix: err.hint.clone().unwrap_or_else(|| DEFAULT_FIX.to_string()),
        }
    }

    /// `path:line:column`, or `<unknown>` when the error has no location.
    pub fn location(&self) -> String {
        match &self.loc {
            Some(loc) => loc.to_string(),
            None => "<unknown>".to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&TuffError> for Diagnostic {
    fn from(err: &TuffError) -> Self {
        Diagnostic::from_error(err, None)
    }
}

fn indent(text: &str) -> String {
    format!("    {}", text.replace('\n', "\n    "))
}

/// Plain multi-section rendering.
pub fn format_diagnostic(diag: &Diagnostic) -> String {
    [
        format!("{} {}", diag.code, diag.location()),
        "  source:".to_string(),
        indent(&diag.source),
        "  cause:".to_string(),
        indent(&diag.message),
        "  reason:".to_string(),
        indent(&diag.reason),
        "  fix:".to_string(),
        indent(&diag.fix),
    ]
    .join("\n")
}

/// Terminal rendering with the same layout as [`format_diagnostic`].
pub fn render_colored(diag: &Diagnostic) -> String {
    let heading = |label: &str| format!("  {}", label.bold());
    [
        format!("{} {}", diag.code.as_str().red().bold(), diag.location().cyan()),
        heading("source:"),
        indent(&diag.source).dimmed().to_string(),
        heading("cause:"),
        indent(&diag.message),
        heading("reason:"),
        indent(&diag.reason),
        heading("fix:"),
        indent(&diag.fix).green().to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_error_is_bare() {
        let err = TuffError::new(ErrorCode::Generic, "bad", None);
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.reason, DEFAULT_REASON);
        assert_eq!(diag.fix, DEFAULT_FIX);
        assert_eq!(diag.location(), "<unknown>");
    }

    #[test]
    fn test_hint_becomes_fix() {
        let err = TuffError::new(ErrorCode::SafetyModByZero, "mod", Some(&Loc::new(1, 5)))
            .with_hint("Prove modulo divisor != 0 via guard or refinement.");
        let diag = Diagnostic::from_error(&err, Some("a % b"));
        assert_eq!(diag.fix, "Prove modulo divisor != 0 via guard or refinement.");
        assert_eq!(diag.source, "a % b\n    ^");
        assert_eq!(diag.location(), "<memory>:1:5");
    }

    #[test]
    fn test_format_indents_multiline_source() {
        let err = TuffError::new(ErrorCode::TypeMismatch, "nope", Some(&Loc::new(1, 3)));
        let text = format_diagnostic(&Diagnostic::from_error(&err, Some("let x")));
        assert!(text.starts_with("E_TYPE_MISMATCH <memory>:1:3\n  source:\n    let x\n      ^"));
        assert!(text.contains("  cause:\n    nope"));
    }

    #[test]
    fn test_json_carries_stable_code() {
        let err = TuffError::new(ErrorCode::SafetyOverflow, "overflow", None);
        let json = Diagnostic::from(&err).to_json().unwrap();
        assert!(json.contains("\"code\": \"E_SAFETY_OVERFLOW\""));
    }
}
