use crate::ast::Loc;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    KwFn,
    KwLet,
    KwStruct,
    KwEnum,
    KwType,
    KwMatch,
    KwCase,
    KwIf,
    KwElse,
    KwFor,
    KwWhile,
    KwIn,
    KwReturn,
    KwBreak,
    KwContinue,
    KwIs,
    KwExtern,
    KwMut,
    KwOut,
    KwTrue,
    KwFalse,
    Ident(String),
    /// Integer literal with its optional type suffix (`10USize`).
    Number {
        value: i64,
        suffix: Option<String>,
    },
    Float(f64),
    StringLiteral(String),
    CharLiteral(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    ColonColon,
    Semicolon,
    Dot,
    DotDot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    EqEq,
    NotEq,
    Bang,
    Question,
    Pipe,
    PipeGt,
    OrOr,
    Amp,
    AndAnd,
    FatArrow,
    Eof,
}

impl TokenKind {
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "fn" => TokenKind::KwFn,
            "let" => TokenKind::KwLet,
            "struct" => TokenKind::KwStruct,
            "enum" => TokenKind::KwEnum,
            "type" => TokenKind::KwType,
            "match" => TokenKind::KwMatch,
            "case" => TokenKind::KwCase,
            "if" => TokenKind::KwIf,
            "else" => TokenKind::KwElse,
            "for" => TokenKind::KwFor,
            "while" => TokenKind::KwWhile,
            "in" => TokenKind::KwIn,
            "return" => TokenKind::KwReturn,
            "break" => TokenKind::KwBreak,
            "continue" => TokenKind::KwContinue,
            "is" => TokenKind::KwIs,
            "extern" => TokenKind::KwExtern,
            "mut" => TokenKind::KwMut,
            "out" => TokenKind::KwOut,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            _ => return None,
        };
        Some(kind)
    }

    /// Short rendering for parser error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Number { value, suffix } => {
                format!("number '{value}{}'", suffix.as_deref().unwrap_or(""))
            }
            TokenKind::Float(value) => format!("number '{value}'"),
            TokenKind::StringLiteral(_) => "string literal".to_string(),
            TokenKind::CharLiteral(_) => "char literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::KwFn => "fn",
            TokenKind::KwLet => "let",
            TokenKind::KwStruct => "struct",
            TokenKind::KwEnum => "enum",
            TokenKind::KwType => "type",
            TokenKind::KwMatch => "match",
            TokenKind::KwCase => "case",
            TokenKind::KwIf => "if",
            TokenKind::KwElse => "else",
            TokenKind::KwFor => "for",
            TokenKind::KwWhile => "while",
            TokenKind::KwIn => "in",
            TokenKind::KwReturn => "return",
            TokenKind::KwBreak => "break",
            TokenKind::KwContinue => "continue",
            TokenKind::KwIs => "is",
            TokenKind::KwExtern => "extern",
            TokenKind::KwMut => "mut",
            TokenKind::KwOut => "out",
            TokenKind::KwTrue => "true",
            TokenKind::KwFalse => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::DotDot => "..",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Lte => "<=",
            TokenKind::Gte => ">=",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Bang => "!",
            TokenKind::Question => "?",
            TokenKind::Pipe => "|",
            TokenKind::PipeGt => "|>",
            TokenKind::OrOr => "||",
            TokenKind::Amp => "&",
            TokenKind::AndAnd => "&&",
            TokenKind::FatArrow => "=>",
            TokenKind::Ident(_)
            | TokenKind::Number { .. }
            | TokenKind::Float(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::CharLiteral(_)
            | TokenKind::Eof => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, line: u32, column: u32) -> Self {
        Self { kind, line, column }
    }

    pub fn loc(&self) -> Loc {
        Loc::new(self.line, self.column)
    }
}
