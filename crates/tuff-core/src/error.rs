//! Compiler errors with stable codes
//!
//! Every failure the front-end or the safety verifier can raise is a
//! [`TuffError`] carrying an [`ErrorCode`]. Codes are part of the public
//! contract: tooling matches on their string form (`E_SAFETY_DIV_BY_ZERO`),
//! so variants may be added but never renamed.

use crate::ast::Loc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TuffError>;

macro_rules! error_codes {
    ($($variant:ident => $code:literal, $summary:literal;)*) => {
        /// Stable diagnostic code
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum ErrorCode {
            $(
                #[serde(rename = $code)]
                $variant,
            )*
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$variant),*];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $code,)*
                }
            }

            /// One-line description used by `tuff explain`.
            pub fn summary(self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $summary,)*
                }
            }
        }

        impl FromStr for ErrorCode {
            type Err = UnknownErrorCode;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($code => Ok(ErrorCode::$variant),)*
                    other => Err(UnknownErrorCode(other.to_string())),
                }
            }
        }
    };
}

error_codes! {
    // Lexer
    LexUnexpectedChar => "E_LEX_UNEXPECTED_CHARACTER", "The source contains a character that does not start any token.";
    LexUnterminatedString => "E_LEX_UNTERMINATED_STRING", "A string literal is missing its closing quote.";
    LexUnterminatedChar => "E_LEX_UNTERMINATED_CHAR", "A character literal is missing its closing quote.";
    LexUnterminatedComment => "E_LEX_UNTERMINATED_BLOCK_COMMENT", "A block comment is missing its closing '*/'.";
    LexInvalidNumber => "E_LEX_INVALID_NUMBER", "A numeric literal is malformed or does not fit in 64 bits.";
    // Parser
    ParseExpectedToken => "E_PARSE_EXPECTED_TOKEN", "The parser required a specific token here.";
    ParseUnexpectedToken => "E_PARSE_UNEXPECTED_TOKEN", "The parser found a token that cannot start or continue this construct.";
    ParseExpectedIdentifier => "E_PARSE_EXPECTED_IDENTIFIER", "A name was required here.";
    ParseInvalidPattern => "E_PARSE_INVALID_PATTERN", "A match or 'is' pattern is malformed.";
    // Structural typing
    TypeUnknownStruct => "E_TYPE_UNKNOWN_STRUCT", "A struct literal names a struct that was never declared.";
    TypeUnknownField => "E_TYPE_UNKNOWN_FIELD", "A struct literal or member access names a field the struct does not declare.";
    TypeArityMismatch => "E_TYPE_ARITY_MISMATCH", "A call passes a different number of arguments than the function declares.";
    TypeMismatch => "E_TYPE_MISMATCH", "A value's type is not assignable to the type its context expects.";
    // Safety proofs
    SafetyDivByZero => "E_SAFETY_DIV_BY_ZERO", "A division's denominator was not proven non-zero.";
    SafetyModByZero => "E_SAFETY_MOD_BY_ZERO", "A modulo's divisor was not proven non-zero.";
    SafetyOverflow => "E_SAFETY_OVERFLOW", "Integer arithmetic is proven able to leave the 32-bit signed range.";
    SafetyOverflowUnproven => "E_SAFETY_OVERFLOW_UNPROVEN", "Integer arithmetic could not be bounded, so overflow safety is unproven.";
    SafetyArrayBounds => "E_SAFETY_ARRAY_BOUNDS", "An index is proven able to fall outside the initialized length of an array.";
    SafetyArrayBoundsUnproven => "E_SAFETY_ARRAY_BOUNDS_UNPROVEN", "An index or array length could not be bounded, so bounds safety is unproven.";
    SafetyNonZeroRefinement => "E_SAFETY_NONZERO_REFINEMENT", "A value flowing into a '!= 0' refined slot was not proven non-zero.";
    SafetyNullablePointerGuard => "E_SAFETY_NULLABLE_POINTER_GUARD", "A nullable pointer was used before being guarded against null.";
    MatchNonExhaustive => "E_MATCH_NON_EXHAUSTIVE", "A match over a union type does not cover every member.";
    // Catch-all
    Generic => "E_GENERIC", "An error without a more specific code.";
}

impl ErrorCode {
    /// Codes raised only in strict-safety mode.
    pub fn is_safety(self) -> bool {
        self == ErrorCode::MatchNonExhaustive || self.as_str().starts_with("E_SAFETY_")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error code '{0}'")]
pub struct UnknownErrorCode(pub String);

/// A located compiler error.
///
/// Displays as `[CODE] message @ line:column`; the optional hint, details
/// and source excerpt feed [`crate::diagnostic::Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}{}", location_suffix(.loc))]
pub struct TuffError {
    pub code: ErrorCode,
    pub message: String,
    pub loc: Option<Loc>,
    pub hint: Option<String>,
    pub details: Option<String>,
    /// Offending source line followed by a caret line.
    pub excerpt: Option<String>,
}

fn location_suffix(loc: &Option<Loc>) -> String {
    loc.as_ref()
        .map(|loc| format!(" @ {}:{}", loc.line, loc.column))
        .unwrap_or_default()
}

impl TuffError {
    pub fn new(code: ErrorCode, message: impl Into<String>, loc: Option<&Loc>) -> Self {
        Self {
            code,
            message: message.into(),
            loc: loc.cloned(),
            hint: None,
            details: None,
            excerpt: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_safety(&self) -> bool {
        self.code.is_safety()
    }

    /// Attach the source excerpt for this error's location, unless one is
    /// already present or the location lies outside `source`.
    pub fn enrich(mut self, source: &str) -> Self {
        if self.excerpt.is_none() {
            if let Some(loc) = &self.loc {
                self.excerpt = source_excerpt(source, loc);
            }
        }
        self
    }

    /// Stamp a file path onto a location that lacks one.
    pub fn in_file(mut self, file_path: &str) -> Self {
        if let Some(loc) = self.loc.as_mut() {
            if loc.file_path.is_none() {
                loc.file_path = Some(file_path.to_string());
            }
        }
        self
    }
}

/// The source line at `loc` with a caret under the offending column.
pub fn source_excerpt(source: &str, loc: &Loc) -> Option<String> {
    let line_index = usize::try_from(loc.line).ok()?.checked_sub(1)?;
    let line = source.lines().nth(line_index)?;
    let pad = usize::try_from(loc.column).unwrap_or(1).saturating_sub(1);
    Some(format!("{line}\n{}^", " ".repeat(pad)))
}
