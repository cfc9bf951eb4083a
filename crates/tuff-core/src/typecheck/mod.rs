//! Refinement and flow-sensitive safety verification
//!
//! The pass assigns every expression a [`TypeInfo`] (a type name plus the
//! integer interval and flags known about it), narrows bindings inside
//! branches using facts derived from guard conditions, and rejects programs
//! whose arithmetic, indexing, division, pointer use or matches cannot be
//! proven safe.
//!
//! Layout:
//! - [`registry`]: one pass over the top-level declarations
//! - [`resolve`]: type expressions to [`TypeInfo`]
//! - [`facts`]: guard conditions to per-identifier bound patches
//! - [`scope`]: persistent scope frames and the post-branch widening
//! - `expr` / `stmt`: the mutually recursive inferencers
//!
//! The first violation aborts the pass.

pub mod facts;
pub mod registry;
pub mod resolve;
pub mod scope;
pub mod type_info;

mod expr;
mod stmt;

pub use facts::{derive_facts, merge_facts, Facts};
pub use registry::Registry;
pub use scope::{Binding, Scope};
pub use type_info::{intersect_bounds, propagate_interval, BoundPatch, TypeInfo};

use crate::ast::{Loc, Program};
use crate::config::CheckOptions;
use crate::error::{ErrorCode, Result, TuffError};
use tracing::debug;
use type_info::{is_numeric, is_type_variable, is_unsigned, named_compatible, numeric_compatible};

/// Verify `program`. Declarations, scopes and facts are rebuilt on every
/// call, so independent programs never share state.
pub fn typecheck(program: &Program, options: &CheckOptions) -> Result<()> {
    let registry = Registry::from_program(program);
    let checker = Checker::new(&registry, options);
    checker.check_program(program).map_err(|err| {
        debug!(code = %err.code, message = %err.message, "verification failed");
        err
    })
}

/// Read-only state shared by every inference call.
pub(crate) struct Checker<'a> {
    registry: &'a Registry<'a>,
    /// Typed top-level bindings, visible in every function body.
    globals: Scope,
    strict: bool,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(registry: &'a Registry<'a>, options: &CheckOptions) -> Self {
        let mut globals = Scope::new();
        for global in registry.globals() {
            let info = registry.resolve_type_info(Some(global.ty));
            globals.declare(global.name, Binding::fixed(info));
        }
        Self {
            registry,
            globals,
            strict: options.strict_safety,
        }
    }

    pub(crate) fn check_program(&self, program: &Program) -> Result<()> {
        let mut scope = self.globals.child();
        let mut facts = Facts::new();
        for stmt in &program.body {
            self.infer_stmt(stmt, &mut scope, &mut facts, None)?;
        }
        debug!(statements = program.body.len(), "program verified");
        Ok(())
    }

    /// The one compatibility rule used for let, assign, arguments, struct
    /// fields, returns and function bodies.
    fn is_assignable(&self, expected: &TypeInfo, actual: &TypeInfo) -> bool {
        expected.is_unknown()
            || actual.is_unknown()
            || named_compatible(&expected.name, &actual.name)
            || is_type_variable(&expected.name)
            || is_type_variable(&actual.name)
            || numeric_compatible(&expected.name, actual)
            || self.registry.is_alias(&expected.name)
    }

    fn require_assignable(&self, expected: &TypeInfo, actual: &TypeInfo, loc: Option<&Loc>, context: &str) -> Result<()> {
        if self.is_assignable(expected, actual) {
            return Ok(());
        }
        let hint = if is_unsigned(&expected.name) && is_numeric(&actual.name) {
            "Prove the value is >= 0 with a guard or refinement before narrowing into an unsigned type."
        } else {
            "Change the value or the annotation so that the types agree."
        };
        Err(TuffError::new(
            ErrorCode::TypeMismatch,
            format!("{context}: expected {}, got {}", expected.name, actual.name),
            loc,
        )
        .with_hint(hint))
    }

    /// A value flowing into a slot refined with `!= 0` must itself be proven
    /// non-zero.
    fn require_nonzero(&self, expected: &TypeInfo, actual: &TypeInfo, loc: Option<&Loc>, context: &str) -> Result<()> {
        if !self.strict || !expected.non_zero || actual.non_zero || actual.is_unknown() {
            return Ok(());
        }
        Err(TuffError::new(
            ErrorCode::SafetyNonZeroRefinement,
            format!("{context} requires a non-zero value"),
            loc,
        )
        .with_hint("Prove the value != 0 via a control-flow guard or a '!= 0' refinement."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn check(source: &str, options: CheckOptions) -> Result<()> {
        let program = parse(&lex(source).unwrap()).unwrap();
        typecheck(&program, &options)
    }

    fn strict_code(source: &str) -> Option<ErrorCode> {
        check(source, CheckOptions::strict()).err().map(|err| err.code)
    }

    #[test]
    fn test_relaxed_mode_skips_safety_proofs() {
        let source = "fn bad(x: I32): I32 => 100 / x;";
        assert_eq!(strict_code(source), Some(ErrorCode::SafetyDivByZero));
        assert!(check(source, CheckOptions::relaxed()).is_ok());
    }

    #[test]
    fn test_structural_errors_are_reported_in_relaxed_mode() {
        let err = check("fn f(): I32 => Missing { x: 1 };", CheckOptions::relaxed()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeUnknownStruct);
    }

    #[test]
    fn test_globals_are_visible_in_functions() {
        let source = "extern let DIVISOR: I32 != 0;\nfn f(n: I32): I32 => n / DIVISOR;";
        assert_eq!(strict_code(source), None);
    }

    #[test]
    fn test_assignability_rules() {
        let program = parse(&lex("type Id = I32;").unwrap()).unwrap();
        let registry = Registry::from_program(&program);
        let checker = Checker::new(&registry, &CheckOptions::strict());

        let i32_info = TypeInfo::named("I32");
        assert!(checker.is_assignable(&i32_info, &TypeInfo::unknown()));
        assert!(checker.is_assignable(&TypeInfo::named("T"), &TypeInfo::bool()));
        assert!(checker.is_assignable(&TypeInfo::named("I64"), &i32_info));
        assert!(checker.is_assignable(&TypeInfo::bare("Id"), &TypeInfo::bool()));
        assert!(!checker.is_assignable(&TypeInfo::named("USize"), &i32_info));
        assert!(!checker.is_assignable(&TypeInfo::bool(), &i32_info));
    }

    #[test]
    fn test_mismatch_hint_mentions_unsigned_narrowing() {
        let err = check("fn f(x: I32): USize => x;", CheckOptions::strict()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TypeMismatch);
        assert!(err.hint.unwrap().contains(">= 0"));
    }
}
