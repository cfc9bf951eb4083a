//! Core of the Tuff compiler's safety verifier.
//!
//! The crate holds the AST data model, a reference lexer and parser, the
//! structured error and diagnostic types, and the refinement and
//! flow-sensitive [`typecheck`] pass that proves the absence of integer
//! overflow, division or modulo by zero, out-of-bounds indexing, null
//! pointer use and non-exhaustive matches.
//!
//! ```no_run
//! use tuff_core::TuffPipeline;
//!
//! let pipeline = TuffPipeline::new();
//! let program = pipeline.check("fn divide(n: I32, d: I32 != 0): I32 => n / d;")?;
//! assert_eq!(program.body.len(), 1);
//! # Ok::<(), tuff_core::TuffError>(())
//! ```

pub mod ast;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod typecheck;

pub use ast::{Loc, Program};
pub use config::{CheckOptions, TuffConfig};
pub use diagnostic::{format_diagnostic, Diagnostic};
pub use error::{ErrorCode, Result, TuffError};
pub use typecheck::typecheck;

use tracing::debug;

/// Parse and verify in one call.
///
/// Errors coming out of [`TuffPipeline::check`] carry the offending source
/// line and, when configured, the file path.
#[derive(Debug, Clone, Default)]
pub struct TuffPipeline {
    options: CheckOptions,
    file_path: Option<String>,
}

impl TuffPipeline {
    /// A pipeline with strict safety enabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    pub fn parse(&self, source: &str) -> Result<Program> {
        let tokens = lexer::lex(source).map_err(|err| self.locate(err, source))?;
        debug!(tokens = tokens.len(), "lexed source");
        parser::parse(&tokens).map_err(|err| self.locate(err, source))
    }

    /// Parse `source` and verify it. On success the program is returned
    /// unchanged.
    pub fn check(&self, source: &str) -> Result<Program> {
        let program = self.parse(source)?;
        typecheck(&program, &self.options).map_err(|err| self.locate(err, source))?;
        Ok(program)
    }

    /// Verify an already-built program, e.g. one deserialized from JSON.
    pub fn check_program(&self, program: Program) -> Result<Program> {
        typecheck(&program, &self.options).map_err(|err| match &self.file_path {
            Some(path) => err.in_file(path),
            None => err,
        })?;
        Ok(program)
    }

    fn locate(&self, err: TuffError, source: &str) -> TuffError {
        let err = err.enrich(source);
        match &self.file_path {
            Some(path) => err.in_file(path),
            None => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_returns_program() {
        let program = TuffPipeline::new()
            .check("fn divide(n: I32, d: I32 != 0): I32 => n / d;")
            .unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_errors_are_enriched() {
        let err = TuffPipeline::new()
            .with_file_path("src/main.tuff")
            .check("fn bad(x: I32): I32 =>\n    100 / x;")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SafetyDivByZero);
        let loc = err.loc.as_ref().unwrap();
        assert_eq!(loc.file_path.as_deref(), Some("src/main.tuff"));
        assert_eq!(loc.line, 2);
        assert!(err.excerpt.unwrap().starts_with("    100 / x;"));
    }

    #[test]
    fn test_relaxed_options() {
        let pipeline = TuffPipeline::new().with_options(CheckOptions::relaxed());
        assert!(!pipeline.options().strict_safety);
        assert!(pipeline.check("fn bad(x: I32): I32 => 100 / x;").is_ok());
    }

    #[test]
    fn test_check_program_from_json() {
        let program = TuffPipeline::new().parse("fn f(x: I32): I32 => 10 / x;").unwrap();
        let json = program.to_json().unwrap();
        let decoded = Program::from_json(&json).unwrap();
        let err = TuffPipeline::new().check_program(decoded).unwrap_err();
        assert_eq!(err.code, ErrorCode::SafetyDivByZero);
    }
}
