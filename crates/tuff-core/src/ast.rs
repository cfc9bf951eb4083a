//! Tuff abstract syntax tree
//!
//! Every node is tagged by a `kind` string and uses camelCase field names, so
//! an AST produced by any upstream front-end (the self-hosted parser, the
//! desugarer, the module loader) deserializes straight into these types.
//! Nodes that can be blamed in a diagnostic carry an optional [`Loc`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a node (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            file_path: None,
            line,
            column,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.file_path.as_deref().unwrap_or("<memory>"),
            self.line,
            self.column
        )
    }
}

/// A flattened, import-resolved compilation unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Program {
    /// Deserialize a JSON AST as emitted by an upstream front-end.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Declarations and statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    FnDecl(FnDecl),
    /// Same shape as [`Stmt::FnDecl`] with `body` absent.
    ExternFnDecl(FnDecl),
    StructDecl(StructDecl),
    EnumDecl(EnumDecl),
    TypeAlias(TypeAlias),
    ExternTypeDecl(ExternTypeDecl),
    LetDecl(LetDecl),
    ExternLetDecl(ExternLetDecl),
    Block(Block),
    ExprStmt(ExprStmt),
    AssignStmt(AssignStmt),
    ReturnStmt(ReturnStmt),
    IfStmt(IfNode),
    WhileStmt(WhileStmt),
    ForStmt(ForStmt),
    BreakStmt(Jump),
    ContinueStmt(Jump),
}

impl Stmt {
    pub fn loc(&self) -> Option<&Loc> {
        match self {
            Stmt::FnDecl(decl) | Stmt::ExternFnDecl(decl) => decl.loc.as_ref(),
            Stmt::StructDecl(decl) => decl.loc.as_ref(),
            Stmt::EnumDecl(decl) => decl.loc.as_ref(),
            Stmt::TypeAlias(decl) => decl.loc.as_ref(),
            Stmt::ExternTypeDecl(decl) => decl.loc.as_ref(),
            Stmt::LetDecl(decl) => decl.loc.as_ref(),
            Stmt::ExternLetDecl(decl) => decl.loc.as_ref(),
            Stmt::Block(block) => block.loc.as_ref(),
            Stmt::ExprStmt(stmt) => stmt.loc.as_ref().or_else(|| stmt.expr.loc()),
            Stmt::AssignStmt(stmt) => stmt.loc.as_ref().or_else(|| stmt.target.loc()),
            Stmt::ReturnStmt(stmt) => stmt.loc.as_ref(),
            Stmt::IfStmt(node) => node.loc.as_ref(),
            Stmt::WhileStmt(stmt) => stmt.loc.as_ref(),
            Stmt::ForStmt(stmt) => stmt.loc.as_ref(),
            Stmt::BreakStmt(jump) | Stmt::ContinueStmt(jump) => jump.loc.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FnDecl {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Expr>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

impl StructDecl {
    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAlias {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<String>,
    pub aliased_type: TypeExpr,
    #[serde(default)]
    pub exported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternTypeDecl {
    pub name: String,
    #[serde(default)]
    pub generics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetDecl {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternLetDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub statements: Vec<Stmt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

/// Shared by `IfStmt` and `IfExpr`. Branches are blocks or bare expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfNode {
    pub condition: Box<Expr>,
    pub then_branch: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_branch: Option<Box<Expr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

/// `for (iterator in start..end) body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub iterator: String,
    pub start: Expr,
    pub end: Expr,
    pub body: Block,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Jump {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    NumberLiteral(NumberLiteral),
    FloatLiteral(FloatLiteral),
    BoolLiteral(BoolLiteral),
    StringLiteral(StringLiteral),
    CharLiteral(CharLiteral),
    Identifier(Identifier),
    BinaryExpr(BinaryExpr),
    UnaryExpr(UnaryExpr),
    CallExpr(CallExpr),
    MemberExpr(MemberExpr),
    IndexExpr(IndexExpr),
    StructInit(StructInit),
    IfExpr(IfNode),
    MatchExpr(MatchExpr),
    IsExpr(IsExpr),
    UnwrapExpr(UnwrapExpr),
    Block(Block),
}

impl Expr {
    pub fn loc(&self) -> Option<&Loc> {
        match self {
            Expr::NumberLiteral(lit) => lit.loc.as_ref(),
            Expr::FloatLiteral(lit) => lit.loc.as_ref(),
            Expr::BoolLiteral(lit) => lit.loc.as_ref(),
            Expr::StringLiteral(lit) => lit.loc.as_ref(),
            Expr::CharLiteral(lit) => lit.loc.as_ref(),
            Expr::Identifier(id) => id.loc.as_ref(),
            Expr::BinaryExpr(bin) => bin.loc.as_ref().or_else(|| bin.left.loc()),
            Expr::UnaryExpr(unary) => unary.loc.as_ref(),
            Expr::CallExpr(call) => call.loc.as_ref().or_else(|| call.callee.loc()),
            Expr::MemberExpr(member) => member.loc.as_ref().or_else(|| member.object.loc()),
            Expr::IndexExpr(index) => index.loc.as_ref().or_else(|| index.target.loc()),
            Expr::StructInit(init) => init.loc.as_ref(),
            Expr::IfExpr(node) => node.loc.as_ref(),
            Expr::MatchExpr(node) => node.loc.as_ref(),
            Expr::IsExpr(node) => node.loc.as_ref().or_else(|| node.expr.loc()),
            Expr::UnwrapExpr(node) => node.loc.as_ref().or_else(|| node.expr.loc()),
            Expr::Block(block) => block.loc.as_ref(),
        }
    }

    /// Integer value of a literal, looking through a unary minus.
    pub fn as_int_literal(&self) -> Option<i64> {
        match self {
            Expr::NumberLiteral(lit) => Some(lit.value),
            Expr::UnaryExpr(UnaryExpr {
                op: UnaryOp::Neg,
                expr,
                ..
            }) => match expr.as_ref() {
                Expr::NumberLiteral(lit) => lit.value.checked_neg(),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(Identifier {
            name: name.into(),
            loc: None,
        })
    }

    pub fn int(value: i64) -> Self {
        Expr::NumberLiteral(NumberLiteral {
            value,
            number_type: None,
            loc: None,
        })
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryExpr(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            loc: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberLiteral {
    pub value: i64,
    /// Literal suffix such as `USize` in `0USize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatLiteral {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolLiteral {
    pub value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharLiteral {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub target: Box<Expr>,
    pub index: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructInit {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldInit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchExpr {
    pub target: Box<Expr>,
    #[serde(default)]
    pub cases: Vec<MatchCase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsExpr {
    pub expr: Box<Expr>,
    pub pattern: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnwrapExpr {
    pub expr: Box<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// The comparison that holds when `self` does not: `< ↔ >=`, `<= ↔ >`, `== ↔ !=`.
    pub fn negated(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Lt => Some(BinaryOp::GtEq),
            BinaryOp::GtEq => Some(BinaryOp::Lt),
            BinaryOp::LtEq => Some(BinaryOp::Gt),
            BinaryOp::Gt => Some(BinaryOp::LtEq),
            BinaryOp::Eq => Some(BinaryOp::NotEq),
            BinaryOp::NotEq => Some(BinaryOp::Eq),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "&")]
    Ref,
    #[serde(rename = "&mut")]
    RefMut,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Ref => "&",
            UnaryOp::RefMut => "&mut",
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Pattern {
    WildcardPattern,
    LiteralPattern(LiteralPattern),
    NamePattern(NamePattern),
    StructPattern(StructPattern),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralPattern {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamePattern {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructPattern {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<PatternField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternField {
    pub field: String,
    pub bind: String,
}

// ---------------------------------------------------------------------------
// Type expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeExpr {
    NamedType(NamedType),
    RefinementType(RefinementType),
    UnionType(UnionType),
    ArrayType(ArrayType),
    PointerType(PointerType),
    TupleType(TupleType),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::NamedType(NamedType {
            name: name.into(),
            generic_args: Vec::new(),
        })
    }

    pub fn refined(base: TypeExpr, op: BinaryOp, value: Expr) -> Self {
        TypeExpr::RefinementType(RefinementType {
            base: Box::new(base),
            op,
            value_expr: Box::new(value),
        })
    }

    /// Surface name of the type, ignoring refinements.
    pub fn display_name(&self) -> String {
        match self {
            TypeExpr::NamedType(named) => named.name.clone(),
            TypeExpr::RefinementType(refined) => refined.base.display_name(),
            TypeExpr::UnionType(union) => {
                format!("{}|{}", union.left.display_name(), union.right.display_name())
            }
            TypeExpr::ArrayType(_) => "Array".to_string(),
            TypeExpr::PointerType(pointer) if pointer.mutable => {
                format!("*mut {}", pointer.to.display_name())
            }
            TypeExpr::PointerType(pointer) => format!("*{}", pointer.to.display_name()),
            TypeExpr::TupleType(_) => "Tuple".to_string(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedType {
    pub name: String,
    #[serde(default)]
    pub generic_args: Vec<TypeExpr>,
}

/// `base op valueExpr`, e.g. `USize < 3` or `I32 != 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementType {
    pub base: Box<TypeExpr>,
    pub op: BinaryOp,
    pub value_expr: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionType {
    pub left: Box<TypeExpr>,
    pub right: Box<TypeExpr>,
}

/// `[element; init; total]`: `init` initialized slots out of `total` capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub element: Box<TypeExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Box<Expr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerType {
    #[serde(default)]
    pub mutable: bool,
    pub to: Box<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleType {
    #[serde(default)]
    pub members: Vec<TypeExpr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_kind_tagged_function() {
        let json = r#"{
            "kind": "Program",
            "body": [{
                "kind": "FnDecl",
                "name": "divide",
                "params": [
                    {"name": "n", "type": {"kind": "NamedType", "name": "I32"}},
                    {"name": "d", "type": {
                        "kind": "RefinementType",
                        "base": {"kind": "NamedType", "name": "I32"},
                        "op": "!=",
                        "valueExpr": {"kind": "NumberLiteral", "value": 0}
                    }}
                ],
                "returnType": {"kind": "NamedType", "name": "I32"},
                "body": {
                    "kind": "BinaryExpr",
                    "op": "/",
                    "left": {"kind": "Identifier", "name": "n"},
                    "right": {"kind": "Identifier", "name": "d", "loc": {"line": 1, "column": 40}}
                }
            }]
        }"#;

        let program = Program::from_json(json).unwrap();
        assert_eq!(program.body.len(), 1);
        let Stmt::FnDecl(decl) = &program.body[0] else {
            panic!("expected FnDecl");
        };
        assert_eq!(decl.params.len(), 2);
        assert!(matches!(
            decl.params[1].ty,
            Some(TypeExpr::RefinementType(RefinementType { op: BinaryOp::NotEq, .. }))
        ));
        let Some(Expr::BinaryExpr(bin)) = &decl.body else {
            panic!("expected binary body");
        };
        assert_eq!(bin.op, BinaryOp::Div);
        assert_eq!(bin.right.loc(), Some(&Loc::new(1, 40)));
    }

    #[test]
    fn test_serialize_uses_kind_and_camel_case() {
        let expr = Expr::IfExpr(IfNode {
            condition: Box::new(Expr::binary(BinaryOp::Eq, Expr::ident("x"), Expr::int(0))),
            then_branch: Box::new(Expr::int(0)),
            else_branch: None,
            loc: None,
        });
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["kind"], "IfExpr");
        assert_eq!(json["condition"]["op"], "==");
        assert_eq!(json["thenBranch"]["kind"], "NumberLiteral");
        assert!(json.get("elseBranch").is_none());
    }

    #[test]
    fn test_unit_pattern_round_trips() {
        let pattern: Pattern = serde_json::from_str(r#"{"kind": "WildcardPattern"}"#).unwrap();
        assert_eq!(pattern, Pattern::WildcardPattern);
    }

    #[test]
    fn test_negated_comparisons() {
        assert_eq!(BinaryOp::Lt.negated(), Some(BinaryOp::GtEq));
        assert_eq!(BinaryOp::LtEq.negated(), Some(BinaryOp::Gt));
        assert_eq!(BinaryOp::Eq.negated(), Some(BinaryOp::NotEq));
        assert_eq!(BinaryOp::NotEq.negated(), Some(BinaryOp::Eq));
        assert_eq!(BinaryOp::Add.negated(), None);
    }

    #[test]
    fn test_int_literal_through_negation() {
        let neg = Expr::UnaryExpr(UnaryExpr {
            op: UnaryOp::Neg,
            expr: Box::new(Expr::int(5)),
            loc: None,
        });
        assert_eq!(neg.as_int_literal(), Some(-5));
        assert_eq!(Expr::ident("x").as_int_literal(), None);
    }

    #[test]
    fn test_type_display_names() {
        let ptr = TypeExpr::PointerType(PointerType {
            mutable: true,
            to: Box::new(TypeExpr::named("I32")),
        });
        assert_eq!(ptr.display_name(), "*mut I32");
        let refined = TypeExpr::refined(TypeExpr::named("USize"), BinaryOp::Lt, Expr::int(3));
        assert_eq!(refined.display_name(), "USize");
    }
}
