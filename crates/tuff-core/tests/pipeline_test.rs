//! End-to-end verification scenarios through `TuffPipeline`
//!
//! Each test feeds Tuff source through the reference front-end and the
//! safety verifier and asserts on the stable error code.

use tuff_core::{CheckOptions, ErrorCode, TuffPipeline};

fn strict(source: &str) -> Result<(), ErrorCode> {
    TuffPipeline::new().check(source).map(|_| ()).map_err(|err| err.code)
}

fn relaxed(source: &str) -> Result<(), ErrorCode> {
    TuffPipeline::new()
        .with_options(CheckOptions::relaxed())
        .check(source)
        .map(|_| ())
        .map_err(|err| err.code)
}

#[test]
fn test_refined_divisor_compiles() {
    assert_eq!(strict("fn divide(n: I32, d: I32 != 0): I32 => n / d;"), Ok(()));
}

#[test]
fn test_unguarded_divisor_fails() {
    assert_eq!(
        strict("fn bad(x: I32): I32 => 100 / x;"),
        Err(ErrorCode::SafetyDivByZero)
    );
}

#[test]
fn test_negated_guard_proves_else_branch() {
    assert_eq!(
        strict("fn safe(x: I32): I32 => { if (x == 0) { 0 } else { 100 / x } }"),
        Ok(())
    );
}

#[test]
fn test_literal_overflow() {
    assert_eq!(
        strict("fn overflow(): I32 => 2147483647 + 1;"),
        Err(ErrorCode::SafetyOverflow)
    );
    assert_eq!(strict("fn ok(): I32 => 100 + 20;"), Ok(()));
}

#[test]
fn test_underflow_is_overflow() {
    assert_eq!(
        strict("fn under(): I32 => -2147483647 - 2;"),
        Err(ErrorCode::SafetyOverflow)
    );
}

#[test]
fn test_array_index_proofs() {
    assert_eq!(
        strict("fn get(arr: [I32; 3; 3]): I32 => { let i: USize < 3 = 2; arr[i] }"),
        Ok(())
    );
    assert_eq!(
        strict("fn get(arr: [I32; 3; 3], i: USize): I32 => arr[i];"),
        Err(ErrorCode::SafetyArrayBoundsUnproven)
    );
}

#[test]
fn test_union_match_exhaustiveness() {
    let decls = "struct Some { value: I32 }\nstruct None { }\ntype Option = Some | None;\n";
    assert_eq!(
        strict(&format!(
            "{decls}fn unwrap_or(o: Option, d: I32): I32 => match (o) {{ case Some {{ value }} = value; case None = d; }};"
        )),
        Ok(())
    );
    assert_eq!(
        strict(&format!("{decls}fn partial(o: Option): I32 => match (o) {{ case Some = 1; }};")),
        Err(ErrorCode::MatchNonExhaustive)
    );
}

#[test]
fn test_relaxed_mode_allows_unproven_code() {
    let sources = [
        "fn bad(x: I32): I32 => 100 / x;",
        "fn m(x: I32): I32 => 100 % x;",
        "fn overflow(): I32 => 2147483647 + 1;",
        "fn get(arr: [I32; 3; 3], i: USize): I32 => arr[i];",
        "struct A { }\nstruct B { }\ntype AB = A | B;\nfn f(x: AB): I32 => match (x) { case A = 1; };",
        "struct N { v: I32 }\nfn f(p: *N | USize == 0USize): I32 => p.v;",
        "fn f(): I32 => { let d: I32 != 0 = 0; 1 }",
    ];
    for source in sources {
        assert_eq!(relaxed(source), Ok(()), "source: {source}");
        let code = strict(source).unwrap_err();
        assert!(code.is_safety(), "{code} from source: {source}");
    }
}

#[test]
fn test_structural_errors_ignore_mode() {
    let sources = [
        ("fn f(): I32 => Nope { };", ErrorCode::TypeUnknownStruct),
        ("struct P { x: I32 }\nfn f(): P => P { y: 1 };", ErrorCode::TypeUnknownField),
        ("fn g(a: I32): I32 => a;\nfn f(): I32 => g();", ErrorCode::TypeArityMismatch),
        ("fn f(): Bool => 1;", ErrorCode::TypeMismatch),
    ];
    for (source, code) in sources {
        assert_eq!(relaxed(source), Err(code), "source: {source}");
        assert_eq!(strict(source), Err(code), "source: {source}");
        assert!(!code.is_safety());
    }
}

#[test]
fn test_range_guards_narrow_both_ways() {
    let source = "fn f(arr: [I32; 8; 8], i: I32): I32 => {\n\
                  if (i >= 0 && i < 8) { arr[i] } else { 0 }\n\
                  }";
    assert_eq!(strict(source), Ok(()));

    let source = "fn f(arr: [I32; 8; 8], i: I32): I32 => {\n\
                  if (i < 0 || i > 7) { 0 } else { arr[i] }\n\
                  }";
    assert_eq!(strict(source), Ok(()));

    let source = "fn f(arr: [I32; 8; 8], i: I32): I32 => {\n\
                  if (i < 0 || i > 8) { 0 } else { arr[i] }\n\
                  }";
    assert_eq!(strict(source), Err(ErrorCode::SafetyArrayBounds));
}

#[test]
fn test_nullable_pointer_requires_guard() {
    let decls = "struct Node { value: I32 }\ntype MaybeNode = *Node | USize == 0USize;\n";
    assert_eq!(
        strict(&format!("{decls}fn read(p: MaybeNode): I32 => p.value;")),
        Err(ErrorCode::SafetyNullablePointerGuard)
    );
    assert_eq!(
        strict(&format!(
            "{decls}fn read(p: MaybeNode): I32 => if (p != 0USize) p.value else 0;"
        )),
        Ok(())
    );
}

#[test]
fn test_reassignment_inside_branch_is_not_trusted_afterwards() {
    let source = "fn f(flag: Bool): I32 => {\n\
                  let d = 10;\n\
                  if (flag) { d = 0; }\n\
                  100 / d\n\
                  }";
    assert_eq!(strict(source), Err(ErrorCode::SafetyDivByZero));
}

#[test]
fn test_counting_loop_with_refined_counter() {
    let source = "fn sum(arr: [I32; 4; 4]): I32 => {\n\
                  let i: USize < 5 = 0;\n\
                  while (i < 4) {\n\
                  arr[i];\n\
                  i = i + 1;\n\
                  }\n\
                  0\n\
                  }";
    assert_eq!(strict(source), Ok(()));
}

#[test]
fn test_parse_errors_surface_with_codes() {
    let err = TuffPipeline::new().check("fn f(x: I32) 1;").unwrap_err();
    assert!(err.code.as_str().starts_with("E_PARSE_"));
    let err = TuffPipeline::new().check("fn f() => \"open;").unwrap_err();
    assert_eq!(err.code, ErrorCode::LexUnterminatedString);
}

#[test]
fn test_independent_runs_share_nothing() {
    let pipeline = TuffPipeline::new();
    assert!(pipeline.check("fn f(x: I32): I32 => 100 / x;").is_err());
    assert!(pipeline.check("fn f(x: I32 != 0): I32 => 100 / x;").is_ok());
}
