//! Statement inference: declarations, assignments, returns and loops

use super::facts::{derive_facts, Facts};
use super::scope::{assigned_in_block, settle, Binding, Scope};
use super::type_info::{intersect_bounds, BoundPatch, TypeInfo};
use super::Checker;
use crate::ast::{AssignStmt, Block, Expr, FnDecl, ForStmt, LetDecl, ReturnStmt, Stmt, WhileStmt};
use crate::error::{ErrorCode, Result, TuffError};
use tracing::{debug, debug_span, trace};

impl Checker<'_> {
    /// Infer one statement. Expression statements, blocks and `if`
    /// statements yield their value type; everything else is `Void`.
    pub(super) fn infer_stmt(
        &self,
        stmt: &Stmt,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        match stmt {
            Stmt::FnDecl(decl) => self.check_fn(decl),
            Stmt::LetDecl(decl) => self.infer_let(decl, scope, facts, expected_return),
            Stmt::AssignStmt(assign) => self.infer_assign(assign, scope, facts, expected_return),
            Stmt::ReturnStmt(ret) => self.infer_return(ret, scope, facts, expected_return),
            Stmt::ExprStmt(stmt) => self.infer_expr(&stmt.expr, scope, facts, expected_return),
            Stmt::Block(block) => self.infer_block(block, scope, facts, expected_return),
            Stmt::IfStmt(node) => self.infer_if(node, scope, facts, expected_return),
            Stmt::WhileStmt(stmt) => self.infer_while(stmt, scope, facts, expected_return),
            Stmt::ForStmt(stmt) => self.infer_for(stmt, scope, facts, expected_return),
            Stmt::ExternFnDecl(_)
            | Stmt::StructDecl(_)
            | Stmt::EnumDecl(_)
            | Stmt::TypeAlias(_)
            | Stmt::ExternTypeDecl(_)
            | Stmt::ExternLetDecl(_)
            | Stmt::BreakStmt(_)
            | Stmt::ContinueStmt(_) => Ok(TypeInfo::void()),
        }
    }

    /// Statements run in a fresh frame; the block's value is that of its last
    /// statement.
    pub(super) fn infer_block(
        &self,
        block: &Block,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let mut inner = scope.child();
        let mut inner_facts = facts.clone();
        let mut last = TypeInfo::void();
        for stmt in &block.statements {
            last = self.infer_stmt(stmt, &mut inner, &mut inner_facts, expected_return)?;
        }
        settle(scope, facts, inner);
        Ok(last)
    }

    fn check_fn(&self, decl: &FnDecl) -> Result<TypeInfo> {
        let Some(body) = &decl.body else {
            return Ok(TypeInfo::void());
        };
        let _span = debug_span!("fn", name = %decl.name).entered();

        let mut scope = self.globals.child();
        for param in &decl.params {
            let info = self.registry.resolve_type_info(param.ty.as_ref());
            scope.declare(&param.name, Binding::fixed(info));
        }
        let expected = decl
            .return_type
            .as_ref()
            .map(|ty| self.registry.resolve_type_info(Some(ty)));

        let mut facts = Facts::new();
        let body_type = self.infer_expr(body, &mut scope, &mut facts, expected.as_ref())?;

        if let Some(expected) = &expected {
            let exempt = body_type.is_unknown() || body_type.is_void() || expected.is_unknown() || expected.is_void();
            if !exempt {
                let loc = body.loc().or(decl.loc.as_ref());
                let context = format!("Body of '{}'", decl.name);
                self.require_assignable(expected, &body_type, loc, &context)?;
                self.require_nonzero(expected, &body_type, loc, &context)?;
            }
        }
        debug!(function = %decl.name, result = %body_type, "function verified");
        Ok(TypeInfo::void())
    }

    fn infer_let(
        &self,
        decl: &LetDecl,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let value = self.infer_expr(&decl.value, scope, facts, expected_return)?;
        let loc = decl.value.loc().or(decl.loc.as_ref());
        let binding = match &decl.ty {
            Some(ty) => {
                let expected = self.registry.resolve_type_info(Some(ty));
                let context = format!("Initializer of '{}'", decl.name);
                self.require_assignable(&expected, &value, loc, &context)?;
                self.require_nonzero(&expected, &value, loc, &context)?;
                let current = intersect_bounds(&expected, &BoundPatch::from(&value));
                Binding::new(expected, current)
            }
            None => Binding::new(value.widened(), value),
        };
        trace!(name = %decl.name, current = ?binding.current, "let");
        // A new binding invalidates facts about a shadowed one.
        facts.forget(&decl.name);
        scope.declare(&decl.name, binding);
        Ok(TypeInfo::void())
    }

    fn infer_assign(
        &self,
        assign: &AssignStmt,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let value = self.infer_expr(&assign.value, scope, facts, expected_return)?;
        let Expr::Identifier(target) = &assign.target else {
            self.infer_expr(&assign.target, scope, facts, expected_return)?;
            return Ok(TypeInfo::void());
        };
        let Some(declared) = scope.get(&target.name).map(|binding| binding.declared.clone()) else {
            return Ok(TypeInfo::void());
        };

        let loc = assign.value.loc().or(assign.loc.as_ref());
        let context = format!("Assignment to '{}'", target.name);
        self.require_assignable(&declared, &value, loc, &context)?;
        self.require_nonzero(&declared, &value, loc, &context)?;

        scope.update(&target.name, intersect_bounds(&declared, &BoundPatch::from(&value)));
        facts.forget(&target.name);
        Ok(TypeInfo::void())
    }

    fn infer_return(
        &self,
        ret: &ReturnStmt,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let value = match &ret.value {
            Some(value) => self.infer_expr(value, scope, facts, expected_return)?,
            None => TypeInfo::void(),
        };
        let Some(expected) = expected_return else {
            return Ok(TypeInfo::void());
        };

        let loc = ret.value.as_ref().and_then(Expr::loc).or(ret.loc.as_ref());
        if expected.is_void() {
            if !value.is_void() && !value.is_unknown() {
                return Err(TuffError::new(
                    ErrorCode::TypeMismatch,
                    format!("Cannot return {} from a function returning Void", value.name),
                    loc,
                )
                .with_hint("Remove the returned value or declare a return type."));
            }
            return Ok(TypeInfo::void());
        }
        self.require_assignable(expected, &value, loc, "Return value")?;
        self.require_nonzero(expected, &value, loc, "Return value")?;
        Ok(TypeInfo::void())
    }

    /// The body may run any number of times, so identifiers it assigns are
    /// seen at their declared bounds both in the condition and the body.
    fn infer_while(
        &self,
        stmt: &WhileStmt,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        let (mut loop_scope, mut loop_facts) = loop_state(&stmt.body, scope, facts);

        let condition = self.infer_expr(&stmt.condition, &mut loop_scope, &mut loop_facts, expected_return)?;
        if !condition.is_bool() && !condition.is_unknown() {
            return Err(TuffError::new(
                ErrorCode::TypeMismatch,
                format!("While condition must be Bool, got {}", condition.name),
                stmt.condition.loc().or(stmt.loc.as_ref()),
            ));
        }

        let mut body_facts = loop_facts.merged(&derive_facts(&stmt.condition, true));
        trace!(facts = body_facts.len(), "while body");
        self.infer_block(&stmt.body, &mut loop_scope, &mut body_facts, expected_return)?;
        settle(scope, facts, loop_scope);
        Ok(TypeInfo::void())
    }

    fn infer_for(
        &self,
        stmt: &ForStmt,
        scope: &mut Scope,
        facts: &mut Facts,
        expected_return: Option<&TypeInfo>,
    ) -> Result<TypeInfo> {
        for bound in [&stmt.start, &stmt.end] {
            let info = self.infer_expr(bound, scope, facts, expected_return)?;
            if !info.is_numeric() && !info.is_unknown() {
                return Err(TuffError::new(
                    ErrorCode::TypeMismatch,
                    format!("For range bounds must be numeric, got {}", info.name),
                    bound.loc().or(stmt.loc.as_ref()),
                ));
            }
        }

        let (mut loop_scope, mut loop_facts) = loop_state(&stmt.body, scope, facts);
        let iterator = TypeInfo::bare("I32").with_bounds(Some(0), None);
        loop_facts.forget(&stmt.iterator);
        loop_scope.declare(&stmt.iterator, Binding::fixed(iterator));
        self.infer_block(&stmt.body, &mut loop_scope, &mut loop_facts, expected_return)?;
        settle(scope, facts, loop_scope);
        Ok(TypeInfo::void())
    }
}

/// Scope and facts seen on every iteration of a loop over `body`.
fn loop_state(body: &Block, scope: &Scope, facts: &Facts) -> (Scope, Facts) {
    let mut loop_scope = scope.child();
    let mut loop_facts = facts.clone();
    for name in assigned_in_block(body) {
        loop_scope.widen(&name);
        loop_facts.forget(&name);
    }
    (loop_scope, loop_facts)
}
