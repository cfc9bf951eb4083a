use crate::ast::{
    ArrayType, AssignStmt, BinaryExpr, BinaryOp, Block, BoolLiteral, CallExpr, CharLiteral, EnumDecl, Expr,
    ExprStmt, ExternLetDecl, ExternTypeDecl, FieldDecl, FieldInit, FloatLiteral, FnDecl, ForStmt, Identifier,
    IfNode, IndexExpr, IsExpr, Jump, LetDecl, LiteralPattern, LiteralValue, Loc, MatchCase, MatchExpr,
    MemberExpr, NamePattern, NamedType, NumberLiteral, Param, Pattern, PatternField, PointerType, Program,
    RefinementType, ReturnStmt, Stmt, StringLiteral, StructDecl, StructInit, StructPattern, TupleType,
    TypeAlias, TypeExpr, UnaryExpr, UnaryOp, UnionType, UnwrapExpr, WhileStmt,
};
use crate::error::{ErrorCode, Result, TuffError};
use crate::token::{Token, TokenKind};

pub fn parse(tokens: &[Token]) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

/// Binding power of infix operators; `is` shares the relational level.
fn infix_precedence(kind: &TokenKind) -> Option<u8> {
    let prec = match kind {
        TokenKind::OrOr => 1,
        TokenKind::AndAnd => 2,
        TokenKind::EqEq | TokenKind::NotEq => 3,
        TokenKind::Lt | TokenKind::Lte | TokenKind::Gt | TokenKind::Gte | TokenKind::KwIs => 4,
        TokenKind::Plus | TokenKind::Minus => 5,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 6,
        _ => return None,
    };
    Some(prec)
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::OrOr => BinaryOp::Or,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Lte => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Gte => BinaryOp::GtEq,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn refinement_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Lte => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Gte => Some(BinaryOp::GtEq),
        _ => None,
    }
}

fn can_start_type(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_) | TokenKind::Star | TokenKind::LBracket | TokenKind::LParen
    )
}

fn can_start_refinement_value(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Number { .. }
            | TokenKind::Float(_)
            | TokenKind::Ident(_)
            | TokenKind::KwTrue
            | TokenKind::KwFalse
            | TokenKind::StringLiteral(_)
            | TokenKind::CharLiteral(_)
            | TokenKind::LParen
            | TokenKind::Minus
            | TokenKind::Bang
    )
}

struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, index: 0 }
    }

    fn parse_program(mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.at_eof() {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // -- statements ---------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt> {
        match &self.current().kind {
            TokenKind::KwOut => self.parse_exported(),
            TokenKind::KwLet => Ok(Stmt::LetDecl(self.parse_let_decl()?)),
            TokenKind::KwStruct => Ok(Stmt::StructDecl(self.parse_struct_decl()?)),
            TokenKind::KwEnum => Ok(Stmt::EnumDecl(self.parse_enum_decl()?)),
            TokenKind::KwType => Ok(Stmt::TypeAlias(self.parse_type_alias()?)),
            TokenKind::KwFn => Ok(Stmt::FnDecl(self.parse_function_decl()?)),
            TokenKind::KwExtern => self.parse_extern(),
            TokenKind::KwReturn => {
                let loc = self.advance().loc();
                let value = if self.at(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(0)?)
                };
                self.expect(&TokenKind::Semicolon, "Expected ';' after return")?;
                Ok(Stmt::ReturnStmt(ReturnStmt { value, loc: Some(loc) }))
            }
            TokenKind::KwIf => {
                let expr = self.parse_primary()?;
                match expr {
                    Expr::IfExpr(node) if matches!(*node.then_branch, Expr::Block(_)) => Ok(Stmt::IfStmt(node)),
                    expr => {
                        self.expect(&TokenKind::Semicolon, "Expected ';' after if expression statement")?;
                        let loc = expr.loc().cloned();
                        Ok(Stmt::ExprStmt(ExprStmt { expr, loc }))
                    }
                }
            }
            TokenKind::KwWhile => {
                let loc = self.advance().loc();
                self.expect(&TokenKind::LParen, "Expected '(' after while")?;
                let condition = self.parse_expression(0)?;
                self.expect(&TokenKind::RParen, "Expected ')' after while condition")?;
                let body = self.parse_block()?;
                Ok(Stmt::WhileStmt(WhileStmt {
                    condition,
                    body,
                    loc: Some(loc),
                }))
            }
            TokenKind::KwFor => Ok(Stmt::ForStmt(self.parse_for_stmt()?)),
            TokenKind::KwBreak => {
                let loc = self.advance().loc();
                self.expect(&TokenKind::Semicolon, "Expected ';' after break")?;
                Ok(Stmt::BreakStmt(Jump { loc: Some(loc) }))
            }
            TokenKind::KwContinue => {
                let loc = self.advance().loc();
                self.expect(&TokenKind::Semicolon, "Expected ';' after continue")?;
                Ok(Stmt::ContinueStmt(Jump { loc: Some(loc) }))
            }
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.parse_expression(0)?;
        let loc = expr.loc().cloned();

        if self.eat(&TokenKind::Eq) {
            let value = self.parse_expression(0)?;
            self.expect(&TokenKind::Semicolon, "Expected ';' after assignment")?;
            return Ok(Stmt::AssignStmt(AssignStmt {
                target: expr,
                value,
                loc,
            }));
        }

        let block_like = matches!(expr, Expr::MatchExpr(_) | Expr::Block(_));
        if !self.eat(&TokenKind::Semicolon) && !self.at(&TokenKind::RBrace) && !block_like {
            self.expect(&TokenKind::Semicolon, "Expected ';' after expression statement")?;
        }
        Ok(Stmt::ExprStmt(ExprStmt { expr, loc }))
    }

    fn parse_exported(&mut self) -> Result<Stmt> {
        self.advance();
        match &self.current().kind {
            TokenKind::KwFn => {
                let mut decl = self.parse_function_decl()?;
                decl.exported = true;
                Ok(Stmt::FnDecl(decl))
            }
            TokenKind::KwStruct => {
                let mut decl = self.parse_struct_decl()?;
                decl.exported = true;
                Ok(Stmt::StructDecl(decl))
            }
            TokenKind::KwEnum => {
                let mut decl = self.parse_enum_decl()?;
                decl.exported = true;
                Ok(Stmt::EnumDecl(decl))
            }
            TokenKind::KwType => {
                let mut decl = self.parse_type_alias()?;
                decl.exported = true;
                Ok(Stmt::TypeAlias(decl))
            }
            _ => Err(self
                .error(ErrorCode::ParseExpectedToken, "Expected declaration after 'out'")
                .with_hint("Use 'out' before a top-level fn/struct/enum/type declaration.")),
        }
    }

    fn parse_extern(&mut self) -> Result<Stmt> {
        let loc = self.advance().loc();
        match &self.current().kind {
            TokenKind::KwFn => {
                self.advance();
                let name = self.expect_ident()?;
                let generics = self.parse_generic_params()?;
                let params = self.parse_params()?;
                let return_type = self.parse_optional_annotation()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after extern fn")?;
                Ok(Stmt::ExternFnDecl(FnDecl {
                    name,
                    generics,
                    params,
                    return_type,
                    body: None,
                    exported: false,
                    loc: Some(loc),
                }))
            }
            TokenKind::KwLet => {
                self.advance();
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Colon, "Expected ':' in extern let")?;
                let ty = self.parse_type()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after extern let")?;
                Ok(Stmt::ExternLetDecl(ExternLetDecl { name, ty, loc: Some(loc) }))
            }
            TokenKind::KwType => {
                self.advance();
                let name = self.expect_ident()?;
                let generics = self.parse_generic_params()?;
                self.expect(&TokenKind::Semicolon, "Expected ';' after extern type")?;
                Ok(Stmt::ExternTypeDecl(ExternTypeDecl {
                    name,
                    generics,
                    loc: Some(loc),
                }))
            }
            _ => Err(self.error(
                ErrorCode::ParseExpectedToken,
                "Expected 'fn', 'let', or 'type' after 'extern'",
            )),
        }
    }

    fn parse_let_decl(&mut self) -> Result<LetDecl> {
        let loc = self.expect(&TokenKind::KwLet, "Expected 'let'")?;
        let name = self.expect_ident()?;
        let ty = self.parse_optional_annotation()?;
        self.expect(&TokenKind::Eq, "Expected '=' in let declaration")?;
        let value = self.parse_expression(0)?;
        self.expect(&TokenKind::Semicolon, "Expected ';' after let declaration")?;
        Ok(LetDecl {
            name,
            ty,
            value,
            loc: Some(loc),
        })
    }

    fn parse_function_decl(&mut self) -> Result<FnDecl> {
        let loc = self.expect(&TokenKind::KwFn, "Expected 'fn'")?;
        let name = self.expect_ident()?;
        let generics = self.parse_generic_params()?;
        let params = self.parse_params()?;
        let return_type = self.parse_optional_annotation()?;
        self.expect(&TokenKind::FatArrow, "Expected '=>' in function declaration")?;

        let body = if self.at(&TokenKind::LBrace) {
            let block = self.parse_block()?;
            self.eat(&TokenKind::Semicolon);
            Expr::Block(block)
        } else {
            let body = self.parse_expression(0)?;
            if !self.at(&TokenKind::RBrace) && !self.at_eof() {
                self.expect(&TokenKind::Semicolon, "Expected ';' after expression function")?;
            }
            body
        };

        Ok(FnDecl {
            name,
            generics,
            params,
            return_type,
            body: Some(body),
            exported: false,
            loc: Some(loc),
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.expect(&TokenKind::LParen, "Expected '(' in function declaration")?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                let name = self.expect_ident()?;
                let ty = self.parse_optional_annotation()?;
                params.push(Param { name, ty });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "Expected ')' after params")?;
        Ok(params)
    }

    fn parse_generic_params(&mut self) -> Result<Vec<String>> {
        let mut generics = Vec::new();
        if !self.eat(&TokenKind::Lt) {
            return Ok(generics);
        }
        if !self.at(&TokenKind::Gt) {
            loop {
                generics.push(self.expect_ident()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::Gt, "Expected '>' after generics")?;
        Ok(generics)
    }

    fn parse_optional_annotation(&mut self) -> Result<Option<TypeExpr>> {
        if self.eat(&TokenKind::Colon) {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    fn parse_struct_decl(&mut self) -> Result<StructDecl> {
        let loc = self.expect(&TokenKind::KwStruct, "Expected 'struct'")?;
        let name = self.expect_ident()?;
        let generics = self.parse_generic_params()?;
        self.expect(&TokenKind::LBrace, "Expected '{' after struct name")?;
        let mut fields = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at_eof() {
            let field = self.expect_ident()?;
            self.expect(&TokenKind::Colon, "Expected ':' in struct field")?;
            let ty = self.parse_type()?;
            fields.push(FieldDecl { name: field, ty });
            if !self.eat(&TokenKind::Comma) {
                self.eat(&TokenKind::Semicolon);
            }
        }
        self.expect(&TokenKind::RBrace, "Expected '}' after struct body")?;
        Ok(StructDecl {
            name,
            generics,
            fields,
            exported: false,
            loc: Some(loc),
        })
    }

    fn parse_enum_decl(&mut self) -> Result<EnumDecl> {
        let loc = self.expect(&TokenKind::KwEnum, "Expected 'enum'")?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace, "Expected '{' after enum name")?;
        let mut variants = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at_eof() {
            variants.push(self.expect_ident()?);
            if !self.eat(&TokenKind::Comma) {
                self.eat(&TokenKind::Semicolon);
            }
        }
        self.expect(&TokenKind::RBrace, "Expected '}' after enum body")?;
        Ok(EnumDecl {
            name,
            variants,
            exported: false,
            loc: Some(loc),
        })
    }

    fn parse_type_alias(&mut self) -> Result<TypeAlias> {
        let loc = self.expect(&TokenKind::KwType, "Expected 'type'")?;
        let name = self.expect_ident()?;
        let generics = self.parse_generic_params()?;
        self.expect(&TokenKind::Eq, "Expected '=' for type alias")?;
        let aliased_type = self.parse_type()?;
        self.expect(&TokenKind::Semicolon, "Expected ';' after type alias")?;
        Ok(TypeAlias {
            name,
            generics,
            aliased_type,
            exported: false,
            loc: Some(loc),
        })
    }

    fn parse_for_stmt(&mut self) -> Result<ForStmt> {
        let loc = self.expect(&TokenKind::KwFor, "Expected 'for'")?;
        self.expect(&TokenKind::LParen, "Expected '(' after for")?;
        let iterator = self.expect_ident()?;
        self.expect(&TokenKind::KwIn, "Expected 'in' in for loop")?;
        let start = self.parse_expression(0)?;
        self.expect(&TokenKind::DotDot, "Expected '..' in for range")?;
        let end = self.parse_expression(0)?;
        self.expect(&TokenKind::RParen, "Expected ')' after for header")?;
        let body = self.parse_block()?;
        Ok(ForStmt {
            iterator,
            start,
            end,
            body,
            loc: Some(loc),
        })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let loc = self.expect(&TokenKind::LBrace, "Expected '{'")?;
        let mut statements = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at_eof() {
            statements.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RBrace, "Expected '}'")?;
        Ok(Block {
            statements,
            loc: Some(loc),
        })
    }

    // -- types ----------------------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeExpr> {
        let mut ty = self.parse_type_term()?;
        while self.eat(&TokenKind::Pipe) {
            let right = self.parse_type_term()?;
            ty = TypeExpr::UnionType(UnionType {
                left: Box::new(ty),
                right: Box::new(right),
            });
        }
        Ok(ty)
    }

    fn parse_type_term(&mut self) -> Result<TypeExpr> {
        if self.eat(&TokenKind::Star) {
            let mutable = self.eat(&TokenKind::KwMut);
            let to = self.parse_type_term()?;
            return Ok(TypeExpr::PointerType(PointerType {
                mutable,
                to: Box::new(to),
            }));
        }

        if self.eat(&TokenKind::LBracket) {
            let element = self.parse_type()?;
            let (mut init, mut total) = (None, None);
            if self.eat(&TokenKind::Semicolon) {
                init = Some(Box::new(self.parse_expression(0)?));
                self.expect(&TokenKind::Semicolon, "Expected ';' in array type")?;
                total = Some(Box::new(self.parse_expression(0)?));
            }
            self.expect(&TokenKind::RBracket, "Expected ']' after array type")?;
            return Ok(TypeExpr::ArrayType(ArrayType {
                element: Box::new(element),
                init,
                total,
            }));
        }

        if self.eat(&TokenKind::LParen) {
            let mut members = Vec::new();
            if !self.at(&TokenKind::RParen) {
                loop {
                    members.push(self.parse_type()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen, "Expected ')' for tuple type")?;
            return Ok(TypeExpr::TupleType(TupleType { members }));
        }

        let mut name = self.expect_ident()?;
        while self.eat(&TokenKind::ColonColon) {
            name.push_str("::");
            name.push_str(&self.expect_ident()?);
        }

        let mut generic_args = Vec::new();
        if self.at(&TokenKind::Lt) && can_start_type(&self.peek(1).kind) {
            self.advance();
            loop {
                generic_args.push(self.parse_type()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Gt, "Expected '>' in generic args")?;
        }
        let named = TypeExpr::NamedType(NamedType { name, generic_args });

        match refinement_op(&self.current().kind) {
            Some(op) if can_start_refinement_value(&self.peek(1).kind) => {
                self.advance();
                let value = self.parse_expression(0)?;
                Ok(TypeExpr::RefinementType(RefinementType {
                    base: Box::new(named),
                    op,
                    value_expr: Box::new(value),
                }))
            }
            _ => Ok(named),
        }
    }

    // -- expressions ----------------------------------------------------------

    fn parse_expression(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let kind = &self.current().kind;
            let Some(prec) = infix_precedence(kind) else {
                break;
            };
            if prec < min_prec {
                break;
            }

            let op_token = self.advance();
            let loc = left.loc().cloned().or_else(|| Some(op_token.loc()));
            if op_token.kind == TokenKind::KwIs {
                let pattern = self.parse_pattern()?;
                left = Expr::IsExpr(IsExpr {
                    expr: Box::new(left),
                    pattern,
                    loc,
                });
                continue;
            }

            let Some(op) = binary_op(&op_token.kind) else {
                break;
            };
            let right = self.parse_expression(prec + 1)?;
            left = Expr::BinaryExpr(BinaryExpr {
                op,
                left: Box::new(left),
                right: Box::new(right),
                loc,
            });
        }

        if self.eat(&TokenKind::Question) {
            let loc = left.loc().cloned();
            left = Expr::UnwrapExpr(UnwrapExpr {
                expr: Box::new(left),
                loc,
            });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current().kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Amp if self.peek(1).kind == TokenKind::KwMut => UnaryOp::RefMut,
            TokenKind::Amp => UnaryOp::Ref,
            _ => return self.parse_primary(),
        };
        let loc = self.advance().loc();
        if op == UnaryOp::RefMut {
            self.advance();
        }
        let expr = self.parse_unary()?;
        Ok(Expr::UnaryExpr(UnaryExpr {
            op,
            expr: Box::new(expr),
            loc: Some(loc),
        }))
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        let loc = Some(token.loc());

        let expr = match token.kind {
            TokenKind::Number { value, suffix } => {
                self.advance();
                Expr::NumberLiteral(NumberLiteral {
                    value,
                    number_type: suffix,
                    loc,
                })
            }
            TokenKind::Float(value) => {
                self.advance();
                Expr::FloatLiteral(FloatLiteral { value, loc })
            }
            kind @ (TokenKind::KwTrue | TokenKind::KwFalse) => {
                self.advance();
                Expr::BoolLiteral(BoolLiteral {
                    value: kind == TokenKind::KwTrue,
                    loc,
                })
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                Expr::StringLiteral(StringLiteral { value, loc })
            }
            TokenKind::CharLiteral(value) => {
                self.advance();
                Expr::CharLiteral(CharLiteral { value, loc })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression(0)?;
                self.expect(&TokenKind::RParen, "Expected ')' after expression")?;
                inner
            }
            TokenKind::LBrace => Expr::Block(self.parse_block()?),
            TokenKind::KwIf => Expr::IfExpr(self.parse_if()?),
            TokenKind::KwMatch => Expr::MatchExpr(self.parse_match()?),
            TokenKind::Ident(name) => {
                self.advance();
                if self.at(&TokenKind::LBrace) {
                    self.parse_struct_init(name, loc)?
                } else {
                    Expr::Identifier(Identifier { name, loc })
                }
            }
            other => {
                return Err(self
                    .error(
                        ErrorCode::ParseUnexpectedToken,
                        format!("Unexpected token {}", other.describe()),
                    )
                    .with_hint("Ensure expressions and statements use valid Tuff syntax."))
            }
        };

        self.parse_postfix(expr)
    }

    fn parse_if(&mut self) -> Result<IfNode> {
        let loc = self.expect(&TokenKind::KwIf, "Expected 'if'")?;
        self.expect(&TokenKind::LParen, "Expected '(' after if")?;
        let condition = self.parse_expression(0)?;
        self.expect(&TokenKind::RParen, "Expected ')' after if condition")?;
        let then_branch = self.parse_branch()?;
        let else_branch = if self.eat(&TokenKind::KwElse) {
            Some(Box::new(self.parse_branch()?))
        } else {
            None
        };
        Ok(IfNode {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
            loc: Some(loc),
        })
    }

    fn parse_branch(&mut self) -> Result<Expr> {
        if self.at(&TokenKind::LBrace) {
            Ok(Expr::Block(self.parse_block()?))
        } else {
            self.parse_expression(0)
        }
    }

    fn parse_match(&mut self) -> Result<MatchExpr> {
        let loc = self.expect(&TokenKind::KwMatch, "Expected 'match'")?;
        self.expect(&TokenKind::LParen, "Expected '(' after match")?;
        let target = self.parse_expression(0)?;
        self.expect(&TokenKind::RParen, "Expected ')' after match target")?;
        self.expect(&TokenKind::LBrace, "Expected '{' for match")?;

        let mut cases = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            self.expect(&TokenKind::KwCase, "Expected case in match")?;
            let pattern = self.parse_pattern()?;
            self.expect(&TokenKind::Eq, "Expected '=' after case pattern")?;
            let body = self.parse_branch()?;
            self.expect(&TokenKind::Semicolon, "Expected ';' after case body")?;
            cases.push(MatchCase { pattern, body });
        }
        self.expect(&TokenKind::RBrace, "Expected '}' for match")?;

        Ok(MatchExpr {
            target: Box::new(target),
            cases,
            loc: Some(loc),
        })
    }

    fn parse_pattern(&mut self) -> Result<Pattern> {
        let token = self.current().clone();
        let pattern = match token.kind {
            TokenKind::Ident(name) if name == "_" => {
                self.advance();
                Pattern::WildcardPattern
            }
            TokenKind::Number { value, .. } => {
                self.advance();
                Pattern::LiteralPattern(LiteralPattern {
                    value: LiteralValue::Int(value),
                })
            }
            kind @ (TokenKind::KwTrue | TokenKind::KwFalse) => {
                self.advance();
                Pattern::LiteralPattern(LiteralPattern {
                    value: LiteralValue::Bool(kind == TokenKind::KwTrue),
                })
            }
            TokenKind::StringLiteral(value) => {
                self.advance();
                Pattern::LiteralPattern(LiteralPattern {
                    value: LiteralValue::Str(value),
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if !self.eat(&TokenKind::LBrace) {
                    return Ok(Pattern::NamePattern(NamePattern { name }));
                }
                let mut fields = Vec::new();
                if !self.at(&TokenKind::RBrace) {
                    loop {
                        let field = self.expect_ident()?;
                        fields.push(PatternField {
                            bind: field.clone(),
                            field,
                        });
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RBrace, "Expected '}' in pattern")?;
                Pattern::StructPattern(StructPattern { name, fields })
            }
            other => {
                return Err(self.error(
                    ErrorCode::ParseInvalidPattern,
                    format!("Expected pattern, got {}", other.describe()),
                ))
            }
        };
        Ok(pattern)
    }

    fn parse_struct_init(&mut self, name: String, loc: Option<Loc>) -> Result<Expr> {
        self.expect(&TokenKind::LBrace, "Expected '{' in struct init")?;
        let mut fields = Vec::new();
        if !self.at(&TokenKind::RBrace) {
            loop {
                let key = self.expect_ident()?;
                self.expect(&TokenKind::Colon, "Expected ':' in struct init")?;
                let value = self.parse_expression(0)?;
                fields.push(FieldInit { key, value });
                if !self.eat(&TokenKind::Comma) || self.at(&TokenKind::RBrace) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RBrace, "Expected '}' in struct init")?;
        Ok(Expr::StructInit(StructInit { name, fields, loc }))
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.eat(&TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.at(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expression(0)?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RParen, "Expected ')' after call args")?;

                expr = match expr {
                    // value.method(a) is sugar for method(value, a)
                    Expr::MemberExpr(member) => {
                        let loc = member.loc.clone();
                        args.insert(0, *member.object);
                        Expr::CallExpr(CallExpr {
                            callee: Box::new(Expr::Identifier(Identifier {
                                name: member.property,
                                loc: loc.clone(),
                            })),
                            args,
                            loc,
                        })
                    }
                    callee => {
                        let loc = callee.loc().cloned();
                        Expr::CallExpr(CallExpr {
                            callee: Box::new(callee),
                            args,
                            loc,
                        })
                    }
                };
            } else if self.eat(&TokenKind::Dot) {
                let property = self.expect_ident()?;
                let loc = expr.loc().cloned();
                expr = Expr::MemberExpr(MemberExpr {
                    object: Box::new(expr),
                    property,
                    loc,
                });
            } else if self.at(&TokenKind::LBracket) {
                let bracket = self.advance().loc();
                let index = self.parse_expression(0)?;
                self.expect(&TokenKind::RBracket, "Expected ']' after index")?;
                let loc = expr.loc().cloned().or(Some(bracket));
                expr = Expr::IndexExpr(IndexExpr {
                    target: Box::new(expr),
                    index: Box::new(index),
                    loc,
                });
            } else {
                return Ok(expr);
            }
        }
    }

    // -- token helpers --------------------------------------------------------

    fn current(&self) -> &'a Token {
        self.peek(0)
    }

    fn peek(&self, n: usize) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + n).min(last)]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if self.index < self.tokens.len() {
            self.index += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.current().kind == kind
    }

    fn at_eof(&self) -> bool {
        self.tokens.is_empty() || self.at(&TokenKind::Eof)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Loc> {
        if self.at(kind) {
            return Ok(self.advance().loc());
        }
        Err(self
            .error(
                ErrorCode::ParseExpectedToken,
                format!("{message}, got {}", self.current().kind.describe()),
            )
            .with_hint("Check token order, punctuation, and delimiters around this location."))
    }

    fn expect_ident(&mut self) -> Result<String> {
        match &self.current().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(
                ErrorCode::ParseExpectedIdentifier,
                format!("Expected identifier, got {}", other.describe()),
            )),
        }
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> TuffError {
        let loc = self.tokens.get(self.index.min(self.tokens.len().saturating_sub(1))).map(Token::loc);
        TuffError::new(code, message, loc.as_ref())
    }
}
