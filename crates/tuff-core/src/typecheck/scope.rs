//! Lexical scopes as a persistent chain of frames
//!
//! Entering a block or branch pushes a frame that shares its parents through
//! `Rc`, so branching costs one allocation regardless of how many bindings
//! are visible. Writes always land in the innermost frame; an assignment to
//! an outer binding shadows it there and is remembered so that [`settle`]
//! can widen the outer binding once the branch is left.

use super::facts::Facts;
use super::type_info::TypeInfo;
use crate::ast::{Block, Expr, Stmt};
use indexmap::{IndexMap, IndexSet};
use std::rc::Rc;

/// What a name is known to hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The annotation (or the widened initializer type): what any future
    /// assignment is checked against.
    pub declared: TypeInfo,
    /// The narrowest value currently proven.
    pub current: TypeInfo,
}

impl Binding {
    pub fn new(declared: TypeInfo, current: TypeInfo) -> Self {
        Self { declared, current }
    }

    pub fn fixed(info: TypeInfo) -> Self {
        Self {
            declared: info.clone(),
            current: info,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Frame {
    bindings: IndexMap<String, Binding>,
    /// Names declared in this frame.
    locals: IndexSet<String>,
    /// Outer names reassigned while this frame was innermost.
    assigned: IndexSet<String>,
    parent: Option<Rc<Frame>>,
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    head: Option<Rc<Frame>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new innermost frame on top of this scope.
    pub fn child(&self) -> Scope {
        Scope {
            head: Some(Rc::new(Frame {
                parent: self.head.clone(),
                ..Frame::default()
            })),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        let mut frame = self.head.as_deref();
        while let Some(current) = frame {
            if let Some(binding) = current.bindings.get(name) {
                return Some(binding);
            }
            frame = current.parent.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn declare(&mut self, name: &str, binding: Binding) {
        let frame = self.head_mut();
        frame.locals.insert(name.to_string());
        frame.bindings.insert(name.to_string(), binding);
    }

    /// Record a new current value for `name`. No-op for unknown names.
    pub fn update(&mut self, name: &str, current: TypeInfo) {
        let Some(declared) = self.get(name).map(|binding| binding.declared.clone()) else {
            return;
        };
        let frame = self.head_mut();
        if !frame.locals.contains(name) {
            frame.assigned.insert(name.to_string());
        }
        frame.bindings.insert(name.to_string(), Binding::new(declared, current));
    }

    /// Drop every narrowing of `name` back to its declared type.
    pub fn widen(&mut self, name: &str) {
        if let Some(declared) = self.get(name).map(|binding| binding.declared.clone()) {
            self.update(name, declared);
        }
    }

    /// Outer names reassigned in the innermost frame.
    pub fn assigned(&self) -> Vec<String> {
        self.head
            .as_ref()
            .map(|frame| frame.assigned.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn head_mut(&mut self) -> &mut Frame {
        let head = self.head.get_or_insert_with(Rc::default);
        Rc::make_mut(head)
    }
}

/// Leave `inner`, which was a child of `outer`: every outer binding it
/// reassigned is widened to its declared type and loses its facts.
pub fn settle(outer: &mut Scope, outer_facts: &mut Facts, inner: Scope) {
    let assigned = inner.assigned();
    drop(inner);
    for name in assigned {
        outer.widen(&name);
        outer_facts.forget(&name);
    }
}

/// Identifiers that are targets of an assignment anywhere inside `block`,
/// including nested blocks and branches.
pub fn assigned_in_block(block: &Block) -> IndexSet<String> {
    let mut names = IndexSet::new();
    collect_stmts(&block.statements, &mut names);
    names
}

/// Identifiers assigned by blocks nested anywhere inside `expr`.
pub fn assigned_in_expr(expr: &Expr) -> IndexSet<String> {
    let mut names = IndexSet::new();
    collect_expr(expr, &mut names);
    names
}

fn collect_stmts(stmts: &[Stmt], names: &mut IndexSet<String>) {
    for stmt in stmts {
        collect_stmt(stmt, names);
    }
}

fn collect_stmt(stmt: &Stmt, names: &mut IndexSet<String>) {
    match stmt {
        Stmt::AssignStmt(assign) => {
            if let Expr::Identifier(id) = &assign.target {
                names.insert(id.name.clone());
            }
            collect_expr(&assign.value, names);
        }
        Stmt::Block(block) => collect_stmts(&block.statements, names),
        Stmt::ExprStmt(stmt) => collect_expr(&stmt.expr, names),
        Stmt::LetDecl(decl) => collect_expr(&decl.value, names),
        Stmt::ReturnStmt(ret) => {
            if let Some(value) = &ret.value {
                collect_expr(value, names);
            }
        }
        Stmt::IfStmt(node) => {
            collect_expr(&node.condition, names);
            collect_expr(&node.then_branch, names);
            if let Some(else_branch) = &node.else_branch {
                collect_expr(else_branch, names);
            }
        }
        Stmt::WhileStmt(stmt) => {
            collect_expr(&stmt.condition, names);
            collect_stmts(&stmt.body.statements, names);
        }
        Stmt::ForStmt(stmt) => collect_stmts(&stmt.body.statements, names),
        // Nested declarations have their own scope.
        Stmt::FnDecl(_)
        | Stmt::ExternFnDecl(_)
        | Stmt::StructDecl(_)
        | Stmt::EnumDecl(_)
        | Stmt::TypeAlias(_)
        | Stmt::ExternTypeDecl(_)
        | Stmt::ExternLetDecl(_)
        | Stmt::BreakStmt(_)
        | Stmt::ContinueStmt(_) => {}
    }
}

fn collect_expr(expr: &Expr, names: &mut IndexSet<String>) {
    match expr {
        Expr::Block(block) => collect_stmts(&block.statements, names),
        Expr::IfExpr(node) => {
            collect_expr(&node.condition, names);
            collect_expr(&node.then_branch, names);
            if let Some(else_branch) = &node.else_branch {
                collect_expr(else_branch, names);
            }
        }
        Expr::MatchExpr(expr) => {
            collect_expr(&expr.target, names);
            for case in &expr.cases {
                collect_expr(&case.body, names);
            }
        }
        Expr::BinaryExpr(bin) => {
            collect_expr(&bin.left, names);
            collect_expr(&bin.right, names);
        }
        Expr::UnaryExpr(unary) => collect_expr(&unary.expr, names),
        Expr::CallExpr(call) => {
            collect_expr(&call.callee, names);
            for arg in &call.args {
                collect_expr(arg, names);
            }
        }
        Expr::MemberExpr(member) => collect_expr(&member.object, names),
        Expr::IndexExpr(index) => {
            collect_expr(&index.target, names);
            collect_expr(&index.index, names);
        }
        Expr::StructInit(init) => {
            for field in &init.fields {
                collect_expr(&field.value, names);
            }
        }
        Expr::IsExpr(is) => collect_expr(&is.expr, names),
        Expr::UnwrapExpr(unwrap) => collect_expr(&unwrap.expr, names),
        Expr::NumberLiteral(_)
        | Expr::FloatLiteral(_)
        | Expr::BoolLiteral(_)
        | Expr::StringLiteral(_)
        | Expr::CharLiteral(_)
        | Expr::Identifier(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;
    use crate::typecheck::type_info::BoundPatch;

    fn i32_literal(value: i128) -> TypeInfo {
        TypeInfo::literal("I32", value)
    }

    #[test]
    fn test_child_sees_parent_and_shadows_locally() {
        let mut outer = Scope::new();
        outer.declare("x", Binding::fixed(i32_literal(1)));
        let mut inner = outer.child();
        assert_eq!(inner.get("x").map(|b| b.current.min), Some(Some(1)));

        inner.update("x", i32_literal(5));
        assert_eq!(inner.get("x").unwrap().current.min, Some(5));
        assert_eq!(outer.get("x").unwrap().current.min, Some(1));
        assert_eq!(inner.assigned(), vec!["x".to_string()]);
    }

    #[test]
    fn test_update_of_local_is_not_reported() {
        let mut scope = Scope::new().child();
        scope.declare("y", Binding::fixed(TypeInfo::named("I32")));
        scope.update("y", i32_literal(2));
        assert!(scope.assigned().is_empty());
        scope.update("missing", i32_literal(2));
        assert!(!scope.contains("missing"));
    }

    #[test]
    fn test_settle_widens_reassigned_outer_bindings() {
        let mut outer = Scope::new();
        outer.declare("d", Binding::new(TypeInfo::named("I32"), i32_literal(4)));
        let mut facts = Facts::new();
        facts.add("d", BoundPatch::nonzero());

        let mut inner = outer.child();
        inner.update("d", i32_literal(0));
        settle(&mut outer, &mut facts, inner);

        let binding = outer.get("d").unwrap();
        assert_eq!(binding.current, TypeInfo::named("I32"));
        assert!(facts.get("d").is_none());
    }

    #[test]
    fn test_settle_propagates_through_nested_frames() {
        let mut outer = Scope::new();
        outer.declare("n", Binding::new(TypeInfo::named("I32"), i32_literal(3)));
        let mut middle = outer.child();
        let mut inner = middle.child();
        let mut facts = Facts::new();

        inner.update("n", i32_literal(0));
        settle(&mut middle, &mut facts, inner);
        assert_eq!(middle.assigned(), vec!["n".to_string()]);
        settle(&mut outer, &mut facts, middle);
        assert_eq!(outer.get("n").unwrap().current.min, TypeInfo::named("I32").min);
    }

    #[test]
    fn test_collects_assignment_targets() {
        let program = parse(
            &lex("fn f() => { let a = 0; while (a < 3) { a = a + 1; if (a == 2) { b = 1; } else { c.x = 2; } } }")
                .unwrap(),
        )
        .unwrap();
        let Stmt::FnDecl(decl) = &program.body[0] else {
            panic!("expected fn");
        };
        let Some(Expr::Block(block)) = &decl.body else {
            panic!("expected block body");
        };
        let names: Vec<String> = assigned_in_block(block).into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
