//! Expression inference and the per-expression safety proofs

use super::facts::{derive_facts, Facts};
use super::scope::{assigned_in_expr, settle, Binding, Scope};
use super::type_info::{intersect_bounds, propagate_interval, Bound, TypeInfo, I32_MAX, I32_MIN};
use super::Checker;
use crate::ast::{
    BinaryExpr, BinaryOp, CallExpr, Expr, IfNode, IndexExpr, Loc, MatchExpr, MemberExpr, Pattern, StructInit,
    UnaryExpr, UnaryOp,
};
use crate::error::{ErrorCode, Result, TuffError};
use indexmap::IndexSet;
use tracing::trace;

impl Checker<'_> {
    pub(super) fn infer_expr(
        &self,
        expr: &Expr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        match expr {
            Expr::NumberLiteral(lit) => Ok(TypeInfo::literal(
                lit.number_type.as_deref().unwrap_or("I32"),
                Bound::from(lit.value),
            )),
            Expr::FloatLiteral(_) => Ok(TypeInfo::bare("F64")),
            Expr::BoolLiteral(_) => Ok(TypeInfo::bool()),
            Expr::StringLiteral(_) => Ok(TypeInfo::bare("*Str")),
            Expr::CharLiteral(_) => Ok(TypeInfo::bare("Char")),
            Expr::Identifier(id) => Ok(self.lookup(&id.name, scope, facts)),
            Expr::BinaryExpr(bin) => self.infer_binary(bin, scope, facts, expected_return),
            Expr::UnaryExpr(unary) => self.infer_unary(unary, scope, facts, expected_return),
            Expr::CallExpr(call) => self.infer_call(call, scope, facts, expected_return),
            Expr::MemberExpr(member) => self.infer_member(member, scope, facts, expected_return),
            Expr::IndexExpr(index) => self.infer_index(index, scope, facts, expected_return),
            Expr::StructInit(init) => self.infer_struct_init(init, scope, facts, expected_return),
            Expr::IfExpr(node) => self.infer_if(node, scope, facts, expected_return),
            Expr::MatchExpr(expr) => self.infer_match(expr, scope, facts, expected_return),
            Expr::IsExpr(is) => {
                self.infer_expr(&is.expr, scope, facts, expected_return)?;
                Ok(TypeInfo::bool())
            }
            Expr::UnwrapExpr(unwrap) => self.infer_expr(&unwrap.expr, scope, facts, expected_return),
            Expr::Block(block) => self.infer_block(block, scope, facts, expected_return),
        }
    }

    /// Current binding narrowed by any fact in force. Names that are not
    /// bindings fall back to the declaration tables.
    fn lookup(&self, name: &str, scope: &Scope, facts: &Facts) -> TypeInfo {
        if let Some(binding) = scope.get(name) {
            return match facts.get(name) {
                Some(patch) => intersect_bounds(&binding.current, patch),
                None => binding.current.clone(),
            };
        }
        if self.registry.function(name).is_some() {
            TypeInfo::bare("Fn")
        } else if self.registry.struct_decl(name).is_some() || self.registry.enum_decl(name).is_some() {
            TypeInfo::bare(name)
        } else {
            TypeInfo::unknown()
        }
    }

    fn infer_binary(
        &self,
        bin: &BinaryExpr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let loc = bin.loc.as_ref();
        let left = self.infer_expr(&bin.left, scope, facts, expected_return)?;

        if bin.op.is_logical() {
            // The right operand only runs when the left one did not decide
            // the result.
            let mut right_facts = facts.merged(&derive_facts(&bin.left, bin.op == BinaryOp::And));
            let right = self.infer_expr(&bin.right, scope, &mut right_facts, expected_return)?;
            for name in assigned_in_expr(&bin.right) {
                facts.forget(&name);
            }
            for operand in [&left, &right] {
                if !operand.is_bool() && !operand.is_unknown() {
                    return Err(TuffError::new(
                        ErrorCode::TypeMismatch,
                        format!("Logical operator '{}' requires Bool operands, got {}", bin.op.as_str(), operand.name),
                        loc,
                    )
                    .with_hint("Compare the value explicitly, e.g. 'x != 0'."));
                }
            }
            return Ok(TypeInfo::bool());
        }

        let right = self.infer_expr(&bin.right, scope, facts, expected_return)?;
        if bin.op.is_comparison() {
            return Ok(TypeInfo::bool());
        }

        // Unknown operands come from unannotated or extern surfaces. They pass
        // the operand check but still owe the divisor and overflow proofs.
        let unknown = left.is_unknown() || right.is_unknown();
        for operand in [&left, &right] {
            if !operand.is_numeric() && !operand.is_unknown() {
                return Err(TuffError::new(
                    ErrorCode::TypeMismatch,
                    format!("Arithmetic operator '{}' requires numeric operands, got {}", bin.op.as_str(), operand.name),
                    loc,
                )
                .with_hint("Only numeric types support arithmetic."));
            }
        }

        let name = arithmetic_result_name(&left, &right);
        match bin.op {
            BinaryOp::Div | BinaryOp::Mod => {
                if self.strict && !right.non_zero {
                    return Err(division_error(bin.op, loc));
                }
                if unknown {
                    return Ok(TypeInfo::unknown());
                }
                Ok(TypeInfo::bare(name))
            }
            op => {
                let bounds = match (left.interval(), right.interval()) {
                    (Some(l), Some(r)) => propagate_interval(op, l, r),
                    _ => None,
                };
                if self.strict && !is_float(&name) {
                    check_overflow(op, bounds, loc)?;
                }
                if unknown {
                    return Ok(TypeInfo::unknown());
                }
                let (min, max) = bounds.map_or((None, None), |(min, max)| (Some(min), Some(max)));
                Ok(TypeInfo::bare(name).with_bounds(min, max))
            }
        }
    }

    fn infer_unary(
        &self,
        unary: &UnaryExpr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let operand = self.infer_expr(&unary.expr, scope, facts, expected_return)?;
        match unary.op {
            UnaryOp::Not => {
                if !operand.is_bool() && !operand.is_unknown() {
                    return Err(TuffError::new(
                        ErrorCode::TypeMismatch,
                        format!("Operator '!' requires a Bool operand, got {}", operand.name),
                        unary.loc.as_ref(),
                    ));
                }
                Ok(TypeInfo::bool())
            }
            UnaryOp::Neg => {
                if operand.is_unknown() {
                    return Ok(operand);
                }
                if !operand.is_numeric() {
                    return Err(TuffError::new(
                        ErrorCode::TypeMismatch,
                        format!("Operator '-' requires a numeric operand, got {}", operand.name),
                        unary.loc.as_ref(),
                    ));
                }
                let min = operand.max.and_then(Bound::checked_neg);
                let max = operand.min.and_then(Bound::checked_neg);
                Ok(TypeInfo {
                    non_zero: operand.non_zero,
                    ..TypeInfo::bare(operand.name.as_str())
                }
                .with_bounds(min, max))
            }
            UnaryOp::Ref | UnaryOp::RefMut => {
                let prefix = if unary.op == UnaryOp::RefMut { "*mut " } else { "*" };
                Ok(TypeInfo {
                    name: format!("{prefix}{}", operand.name),
                    non_zero: true,
                    nullable_pointer: None,
                    ..operand
                })
            }
        }
    }

    fn infer_call(
        &self,
        call: &CallExpr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.infer_expr(arg, scope, facts, expected_return)?);
        }

        let signature = match call.callee.as_ref() {
            Expr::Identifier(id) => self.registry.function(&id.name),
            other => {
                self.infer_expr(other, scope, facts, expected_return)?;
                None
            }
        };
        let Some(signature) = signature else {
            return Ok(TypeInfo::unknown());
        };
        let decl = signature.decl;

        if !signature.is_extern && decl.params.len() != args.len() {
            return Err(TuffError::new(
                ErrorCode::TypeArityMismatch,
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    decl.name,
                    decl.params.len(),
                    args.len()
                ),
                call.loc.as_ref(),
            )
            .with_hint(format!("Call '{}' with exactly {} argument(s).", decl.name, decl.params.len())));
        }

        for ((param, arg), arg_expr) in decl.params.iter().zip(&args).zip(&call.args) {
            let expected = self.registry.resolve_type_info(param.ty.as_ref());
            let loc = arg_expr.loc().or(call.loc.as_ref());
            if self.strict && arg.is_nullable() && expected.name.starts_with('*') && !expected.is_nullable() {
                return Err(nullable_error(
                    format!("Nullable pointer passed to parameter '{}' of '{}'", param.name, decl.name),
                    loc,
                ));
            }
            if !signature.is_extern {
                let context = format!("Argument '{}' of '{}'", param.name, decl.name);
                self.require_assignable(&expected, arg, loc, &context)?;
            }
            let context = format!("Parameter '{}' of '{}'", param.name, decl.name);
            self.require_nonzero(&expected, arg, loc, &context)?;
        }

        Ok(self.registry.resolve_type_info(decl.return_type.as_ref()))
    }

    fn infer_member(
        &self,
        member: &MemberExpr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let object = self.infer_expr(&member.object, scope, facts, expected_return)?;
        if self.strict && object.is_nullable() {
            return Err(nullable_error(
                format!("Cannot access '{}' through a nullable pointer", member.property),
                member.loc.as_ref(),
            ));
        }

        if matches!(member.property.as_str(), "length" | "init") && object.name == "Array" {
            let upper = object.array_total.or(object.array_init);
            return Ok(TypeInfo::bare("USize").with_bounds(Some(0), upper));
        }

        let struct_name = object
            .name
            .strip_prefix("*mut ")
            .or_else(|| object.name.strip_prefix('*'))
            .unwrap_or(&object.name);
        let Some(decl) = self.registry.struct_decl(struct_name) else {
            return Ok(TypeInfo::unknown());
        };
        match decl.field(&member.property) {
            Some(field) => Ok(self.registry.resolve_type_info(Some(&field.ty))),
            None => Err(unknown_field(&decl.name, &member.property, member.loc.as_ref())),
        }
    }

    fn infer_index(
        &self,
        index: &IndexExpr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let target = self.infer_expr(&index.target, scope, facts, expected_return)?;
        let position = self.infer_expr(&index.index, scope, facts, expected_return)?;
        if !self.strict {
            return Ok(TypeInfo::unknown());
        }

        let loc = index.loc.as_ref();
        if target.is_nullable() {
            return Err(nullable_error("Cannot index through a nullable pointer".to_string(), loc));
        }
        match (target.array_init, position.interval()) {
            (Some(init), Some((min, max))) => {
                if min < 0 || max >= init {
                    return Err(TuffError::new(ErrorCode::SafetyArrayBounds, "Array index may be out of bounds", loc)
                        .with_hint("Ensure 0 <= index < initialized length.")
                        .with_details(format!("index is in [{min}, {max}], initialized length is {init}")));
                }
            }
            (Some(_), None) => return Err(bounds_unproven(loc)),
            (None, _) if target.name == "Array" => return Err(bounds_unproven(loc)),
            (None, _) => {}
        }
        Ok(TypeInfo::unknown())
    }

    fn infer_struct_init(
        &self,
        init: &StructInit,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let Some(decl) = self.registry.struct_decl(&init.name) else {
            return Err(TuffError::new(
                ErrorCode::TypeUnknownStruct,
                format!("Unknown struct '{}'", init.name),
                init.loc.as_ref(),
            )
            .with_hint("Declare the struct before constructing it."));
        };
        for field in &init.fields {
            let Some(declared) = decl.field(&field.key) else {
                return Err(unknown_field(&decl.name, &field.key, field.value.loc().or(init.loc.as_ref())));
            };
            let value = self.infer_expr(&field.value, scope, facts, expected_return)?;
            let expected = self.registry.resolve_type_info(Some(&declared.ty));
            let context = format!("Field '{}' of '{}'", field.key, decl.name);
            self.require_assignable(&expected, &value, field.value.loc().or(init.loc.as_ref()), &context)?;
        }
        Ok(TypeInfo::bare(init.name.as_str()))
    }

    /// Shared by `if` expressions and statements. Each branch sees its own
    /// scope frame and the facts implied by the condition.
    pub(super) fn infer_if(
        &self,
        node: &IfNode,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let condition = self.infer_expr(&node.condition, scope, facts, expected_return)?;
        if !condition.is_bool() && !condition.is_unknown() {
            return Err(TuffError::new(
                ErrorCode::TypeMismatch,
                format!("If condition must be Bool, got {}", condition.name),
                node.condition.loc().or(node.loc.as_ref()),
            ));
        }

        let then_facts = derive_facts(&node.condition, true);
        trace!(facts = then_facts.len(), "then branch");
        let then_type = self.infer_branch(&node.then_branch, then_facts, scope, facts, expected_return)?;

        match &node.else_branch {
            Some(else_branch) => {
                let else_facts = derive_facts(&node.condition, false);
                trace!(facts = else_facts.len(), "else branch");
                let else_type = self.infer_branch(else_branch, else_facts, scope, facts, expected_return)?;
                Ok(then_type.join(&else_type))
            }
            None => Ok(TypeInfo::bare(then_type.name)),
        }
    }

    /// Infer a branch body under `branch_facts` layered over `facts`.
    fn infer_branch(
        &self,
        body: &Expr,
        branch_facts: Facts,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let mut inner = scope.child();
        let mut inner_facts = facts.merged(&branch_facts);
        let result = self.infer_expr(body, &mut inner, &mut inner_facts, expected_return)?;
        settle(scope, facts, inner);
        Ok(result)
    }

    fn infer_match(
        &self,
        expr: &MatchExpr,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let target = self.infer_expr(&expr.target, scope, facts, expected_return)?;

        let has_wildcard = expr.cases.iter().any(|case| matches!(case.pattern, Pattern::WildcardPattern));
        if self.strict && !has_wildcard && !target.union_tags.is_empty() {
            let covered: IndexSet<&str> = expr
                .cases
                .iter()
                .filter_map(|case| match &case.pattern {
                    Pattern::NamePattern(pattern) => Some(pattern.name.as_str()),
                    Pattern::StructPattern(pattern) => Some(pattern.name.as_str()),
                    _ => None,
                })
                .collect();
            let missing: Vec<&str> = target
                .union_tags
                .iter()
                .map(String::as_str)
                .filter(|tag| !covered.contains(tag))
                .collect();
            if !missing.is_empty() {
                return Err(TuffError::new(
                    ErrorCode::MatchNonExhaustive,
                    format!("Non-exhaustive match: missing case for {}", missing.join(", ")),
                    expr.loc.as_ref(),
                )
                .with_hint("Add missing case arms or a wildcard case '_'."));
            }
        }

        let mut result: Option<TypeInfo> = None;
        for case in &expr.cases {
            let mut arm_scope = scope.child();
            let mut arm_facts = facts.clone();
            if let Pattern::StructPattern(pattern) = &case.pattern {
                let decl = self.registry.struct_decl(&pattern.name);
                for field in &pattern.fields {
                    let info = match decl {
                        Some(decl) => match decl.field(&field.field) {
                            Some(declared) => self.registry.resolve_type_info(Some(&declared.ty)),
                            None => return Err(unknown_field(&decl.name, &field.field, expr.loc.as_ref())),
                        },
                        None => TypeInfo::unknown(),
                    };
                    arm_facts.forget(&field.bind);
                    arm_scope.declare(&field.bind, Binding::fixed(info));
                }
            }
            let arm = self.infer_expr(&case.body, &mut arm_scope, &mut arm_facts, expected_return)?;
            settle(scope, facts, arm_scope);
            result = Some(match result {
                Some(previous) => previous.join(&arm),
                None => arm,
            });
        }
        Ok(result.unwrap_or_else(TypeInfo::unknown))
    }
}

/// Untyped integer literals are `I32`; the other operand's type wins.
fn arithmetic_result_name(left: &TypeInfo, right: &TypeInfo) -> String {
    if left.name == "I32" {
        right.name.clone()
    } else {
        left.name.clone()
    }
}

fn is_float(name: &str) -> bool {
    matches!(name, "F32" | "F64")
}

fn check_overflow(op: BinaryOp, bounds: Option<(Bound, Bound)>, loc: Option<&Loc>) -> Result<()> {
    match bounds {
        None => Err(TuffError::new(
            ErrorCode::SafetyOverflowUnproven,
            format!("Cannot prove overflow safety for '{}'", op.as_str()),
            loc,
        )
        .with_hint("Add range checks or widen arithmetic before narrowing.")),
        Some((min, max)) if min < I32_MIN || max > I32_MAX => Err(TuffError::new(
            ErrorCode::SafetyOverflow,
            format!("Integer overflow/underflow proven possible for '{}'", op.as_str()),
            loc,
        )
        .with_hint("Constrain operands or use a larger intermediate numeric type.")
        .with_details(format!("result range is [{min}, {max}]"))),
        Some(_) => Ok(()),
    }
}

fn division_error(op: BinaryOp, loc: Option<&Loc>) -> TuffError {
    if op == BinaryOp::Mod {
        TuffError::new(ErrorCode::SafetyModByZero, "Modulo divisor may be zero", loc)
            .with_hint("Prove modulo divisor != 0 via guard or refinement.")
    } else {
        TuffError::new(ErrorCode::SafetyDivByZero, "Division denominator may be zero", loc)
            .with_hint("Prove denominator != 0 via refinement type or control-flow guard.")
    }
}

fn bounds_unproven(loc: Option<&Loc>) -> TuffError {
    TuffError::new(
        ErrorCode::SafetyArrayBoundsUnproven,
        "Cannot prove array index bound safety",
        loc,
    )
    .with_hint("Guard the index against a literal bound or refine it, e.g. 'USize < 3'.")
}

fn nullable_error(message: String, loc: Option<&Loc>) -> TuffError {
    TuffError::new(ErrorCode::SafetyNullablePointerGuard, message, loc)
        .with_hint("Guard the pointer with 'if (p != 0USize)' before using it.")
}

fn unknown_field(struct_name: &str, field: &str, loc: Option<&Loc>) -> TuffError {
    TuffError::new(
        ErrorCode::TypeUnknownField,
        format!("Struct '{struct_name}' has no field '{field}'"),
        loc,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckOptions;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::typecheck::typecheck;

    fn code(source: &str) -> Option<ErrorCode> {
        let program = parse(&lex(source).unwrap()).unwrap();
        typecheck(&program, &CheckOptions::strict()).err().map(|err| err.code)
    }

    #[test]
    fn test_division_requires_nonzero_divisor() {
        assert_eq!(code("fn divide(n: I32, d: I32 != 0): I32 => n / d;"), None);
        assert_eq!(code("fn bad(x: I32): I32 => 100 / x;"), Some(ErrorCode::SafetyDivByZero));
        assert_eq!(code("fn bad(x: I32): I32 => 100 % x;"), Some(ErrorCode::SafetyModByZero));
        assert_eq!(code("fn lit(): I32 => 100 / 4;"), None);
    }

    #[test]
    fn test_overflow_proofs() {
        assert_eq!(code("fn overflow(): I32 => 2147483647 + 1;"), Some(ErrorCode::SafetyOverflow));
        assert_eq!(code("fn ok(): I32 => 100 + 20;"), None);
        assert_eq!(code("fn wide(x: I32): I32 => x * 2;"), Some(ErrorCode::SafetyOverflow));
        assert_eq!(code("fn open(n: USize): USize => n + 1USize;"), Some(ErrorCode::SafetyOverflowUnproven));
        assert_eq!(code("fn small(a: I32 < 10, b: I32 < 10): I32 => a * b;"), Some(ErrorCode::SafetyOverflow));
        assert_eq!(
            code("fn tight(a: USize < 100, b: USize < 100): USize => a * b;"),
            None
        );
    }

    #[test]
    fn test_floats_skip_overflow_reasoning() {
        assert_eq!(code("fn f(): F64 => 1.5 + 2.5;"), None);
    }

    #[test]
    fn test_guard_narrows_else_branch() {
        assert_eq!(code("fn safe(x: I32): I32 => if (x == 0) 0 else 100 / x;"), None);
        assert_eq!(code("fn then_only(x: I32): I32 => if (x != 0) 100 / x else 0;"), None);
        assert_eq!(code("fn wrong(x: I32): I32 => if (x != 0) 0 else 100 / x;"), Some(ErrorCode::SafetyDivByZero));
    }

    #[test]
    fn test_short_circuit_facts() {
        assert_eq!(code("fn f(x: I32): Bool => x != 0 && 10 / x > 1;"), None);
        assert_eq!(code("fn g(x: I32): Bool => x == 0 || 10 / x > 1;"), None);
        assert_eq!(code("fn h(x: I32): Bool => x == 0 && 10 / x > 1;"), Some(ErrorCode::SafetyDivByZero));
    }

    #[test]
    fn test_logical_operands_must_be_bool() {
        assert_eq!(code("fn f(x: I32): Bool => x && true;"), Some(ErrorCode::TypeMismatch));
        assert_eq!(code("fn f(x: I32): Bool => !x;"), Some(ErrorCode::TypeMismatch));
    }

    #[test]
    fn test_array_indexing() {
        assert_eq!(
            code("fn f(arr: [I32; 3; 3]): I32 => { let i: USize < 3 = 2; arr[i]; 0 }"),
            None
        );
        assert_eq!(
            code("fn f(arr: [I32; 3; 3], i: USize): I32 => { arr[i]; 0 }"),
            Some(ErrorCode::SafetyArrayBoundsUnproven)
        );
        assert_eq!(
            code("fn f(arr: [I32; 3; 3], i: USize < 5): I32 => { arr[i]; 0 }"),
            Some(ErrorCode::SafetyArrayBounds)
        );
        assert_eq!(
            code("fn f(arr: [I32; 3; 3], i: USize): I32 => { if (i < 3) { arr[i]; } 0 }"),
            None
        );
    }

    #[test]
    fn test_array_length_is_bounded() {
        assert_eq!(
            code("fn f(arr: [I32; 2; 4]): USize => arr.length + 1USize;"),
            None
        );
    }

    #[test]
    fn test_calls_check_arity_types_and_nonzero() {
        let decls = "fn div(n: I32, d: I32 != 0): I32 => n / d;\nextern fn ext(x: I32): I32;\n";
        assert_eq!(
            code(&format!("{decls}fn a(): I32 => div(1);")),
            Some(ErrorCode::TypeArityMismatch)
        );
        assert_eq!(
            code(&format!("{decls}fn b(): I32 => div(1, true);")),
            Some(ErrorCode::TypeMismatch)
        );
        assert_eq!(
            code(&format!("{decls}fn c(x: I32): I32 => div(1, x);")),
            Some(ErrorCode::SafetyNonZeroRefinement)
        );
        assert_eq!(code(&format!("{decls}fn d(): I32 => div(1, 2);")), None);
        assert_eq!(code(&format!("{decls}fn e(): I32 => ext(true);")), None);
        assert_eq!(code(&format!("{decls}fn g(): I32 => ext(1, 2);")), None);
    }

    #[test]
    fn test_extern_calls_skip_arity() {
        assert_eq!(code("extern fn print(x: I32);\nfn f(): I32 => { print(1, 2); 0 }"), None);
        assert_eq!(
            code("extern fn check(d: I32 != 0);\nfn f(x: I32): I32 => { check(x, 1); 0 }"),
            Some(ErrorCode::SafetyNonZeroRefinement)
        );
    }

    #[test]
    fn test_unsigned_parameter_needs_nonnegative_argument() {
        let decls = "fn take(n: USize): USize => n;\n";
        assert_eq!(code(&format!("{decls}fn a(): USize => take(3);")), None);
        assert_eq!(
            code(&format!("{decls}fn b(x: I32): USize => take(x);")),
            Some(ErrorCode::TypeMismatch)
        );
    }

    #[test]
    fn test_struct_construction_and_fields() {
        let decls = "struct Point { x: I32, y: I32 }\n";
        assert_eq!(code(&format!("{decls}fn a(): I32 => Point {{ x: 1, y: 2 }}.x;")), None);
        assert_eq!(
            code(&format!("{decls}fn b(): Point => Point {{ z: 1 }};")),
            Some(ErrorCode::TypeUnknownField)
        );
        assert_eq!(
            code(&format!("{decls}fn c(): Point => Point {{ x: true }};")),
            Some(ErrorCode::TypeMismatch)
        );
        assert_eq!(
            code(&format!("{decls}fn d(p: *Point): I32 => p.w;")),
            Some(ErrorCode::TypeUnknownField)
        );
    }

    #[test]
    fn test_nullable_pointer_guard() {
        let decls = "struct Node { v: I32 }\n";
        assert_eq!(
            code(&format!("{decls}fn a(p: *Node | USize == 0USize): I32 => p.v;")),
            Some(ErrorCode::SafetyNullablePointerGuard)
        );
        assert_eq!(
            code(&format!("{decls}fn b(p: *Node | USize == 0USize): I32 => if (p != 0USize) p.v else 0;")),
            None
        );
        assert_eq!(
            code(&format!("{decls}fn c(p: *Node | USize == 0USize): I32 => if (p == 0USize) 0 else p.v;")),
            None
        );
        assert_eq!(
            code(&format!("{decls}fn take(n: *Node): I32 => n.v;\nfn d(p: *Node | USize == 0USize): I32 => take(p);")),
            Some(ErrorCode::SafetyNullablePointerGuard)
        );
    }

    #[test]
    fn test_match_exhaustiveness() {
        let decls = "struct Circle { r: I32 }\nstruct Square { s: I32 }\ntype Shape = Circle | Square;\n";
        assert_eq!(
            code(&format!("{decls}fn a(s: Shape): I32 => match (s) {{ case Circle {{ r }} = r; case Square = 1; }};")),
            None
        );
        let err = {
            let source = format!("{decls}fn b(s: Shape): I32 => match (s) {{ case Circle = 0; }};");
            let program = parse(&lex(&source).unwrap()).unwrap();
            typecheck(&program, &CheckOptions::strict()).unwrap_err()
        };
        assert_eq!(err.code, ErrorCode::MatchNonExhaustive);
        assert!(err.message.contains("Square"));
        assert_eq!(
            code(&format!("{decls}fn c(s: Shape): I32 => match (s) {{ case Circle = 0; case _ = 1; }};")),
            None
        );
    }

    #[test]
    fn test_match_arms_join_bounds() {
        let decls = "struct Circle { r: I32 }\nstruct Square { s: I32 }\ntype Shape = Circle | Square;\n";
        assert_eq!(
            code(&format!(
                "{decls}fn f(s: Shape): I32 => {{ let d = match (s) {{ case Circle = 1; case Square = 0; }}; 10 / d }}"
            )),
            Some(ErrorCode::SafetyDivByZero)
        );
        assert_eq!(
            code(&format!(
                "{decls}fn f(s: Shape): I32 => {{ let d = match (s) {{ case Circle = 1; case Square = 2; }}; 10 / d }}"
            )),
            None
        );
    }

    #[test]
    fn test_pattern_binding_drops_outer_guard() {
        let decls = "struct Circle { r: I32 }\nstruct Square { s: I32 }\ntype Shape = Circle | Square;\n";
        assert_eq!(
            code(&format!(
                "{decls}fn f(s: Shape, r: I32): I32 => if (r != 0) match (s) {{ case Circle {{ r }} = 10 / r; case Square = 1; }} else 0;"
            )),
            Some(ErrorCode::SafetyDivByZero)
        );
        assert_eq!(
            code(&format!(
                "{decls}fn g(s: Shape): I32 => match (s) {{ case Circle {{ r }} = if (r != 0) 10 / r else 0; case Square = 1; }};"
            )),
            None
        );
    }

    #[test]
    fn test_address_of_is_nonzero_pointer() {
        assert_eq!(code("fn take(p: *I32): I32 => 0;\nfn f(x: I32): I32 => take(&x);"), None);
        assert_eq!(code("fn take(p: *I32): I32 => 0;\nfn f(x: I32): I32 => take(&mut x);"), None);
        assert_eq!(
            code("fn take(p: *mut I32): I32 => 0;\nfn f(x: I32): I32 => take(&x);"),
            Some(ErrorCode::TypeMismatch)
        );
    }

    #[test]
    fn test_negation_flips_interval() {
        assert_eq!(code("fn f(x: I32 > 0): I32 => 10 / -x;"), None);
        assert_eq!(code("fn g(x: I32 >= 0): I32 => 10 / -x;"), Some(ErrorCode::SafetyDivByZero));
    }

    #[test]
    fn test_unknown_operands_still_owe_proofs() {
        let raw = "extern fn raw();\n";
        assert_eq!(
            code(&format!("{raw}fn f(x: I32): I32 => raw() / x;")),
            Some(ErrorCode::SafetyDivByZero)
        );
        assert_eq!(code("fn g(x: I32): I32 => mystery % x;"), Some(ErrorCode::SafetyModByZero));
        assert_eq!(code(&format!("{raw}fn h(): I32 => 10 / raw();")), Some(ErrorCode::SafetyDivByZero));
        assert_eq!(code(&format!("{raw}fn k(): I32 => raw() + 1;")), Some(ErrorCode::SafetyOverflowUnproven));
        assert_eq!(code(&format!("{raw}fn m(d: I32 != 0): I32 => raw() / d;")), None);
    }

    #[test]
    fn test_unknown_passes_type_checks() {
        let raw = "extern fn raw();\n";
        assert_eq!(code(&format!("{raw}fn f(): I32 => {{ let x: I32 = raw(); x }}")), None);
        assert_eq!(code(&format!("{raw}fn g(): Bool => raw() == 1;")), None);
    }
}
