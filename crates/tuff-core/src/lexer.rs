use crate::ast::Loc;
use crate::error::{ErrorCode, Result, TuffError};
use crate::token::{Token, TokenKind};

pub fn lex(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).lex()
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn lex(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_ws_and_comments()?;
            let Some(current) = self.peek() else {
                break;
            };
            let (line, column) = (self.line, self.column);

            let kind = if is_ident_start(current) {
                self.lex_ident_or_keyword()
            } else if current.is_ascii_digit() {
                self.lex_number()?
            } else if current == b'"' {
                self.lex_string()?
            } else if current == b'\'' {
                self.lex_char()?
            } else if let Some(kind) = self.lex_symbol(current) {
                kind
            } else {
                let ch = self.input[self.pos..].chars().next().unwrap_or('\0');
                return Err(TuffError::new(
                    ErrorCode::LexUnexpectedChar,
                    format!("Unexpected character '{ch}'"),
                    Some(&Loc::new(line, column)),
                )
                .with_hint("Remove the character or replace it with valid syntax."));
            };
            tokens.push(Token::new(kind, line, column));
        }

        tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
        Ok(tokens)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_n(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if byte & 0xC0 != 0x80 {
            // UTF-8 continuation bytes share the column of their lead byte
            self.column += 1;
        }
        Some(byte)
    }

    fn bump_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn here(&self) -> Loc {
        Loc::new(self.line, self.column)
    }

    fn skip_ws_and_comments(&mut self) -> Result<()> {
        loop {
            self.bump_while(|byte| byte.is_ascii_whitespace());

            match (self.peek(), self.peek_n(1)) {
                (Some(b'/'), Some(b'/')) => {
                    self.bump_while(|byte| byte != b'\n');
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.here();
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_n(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(TuffError::new(
                                    ErrorCode::LexUnterminatedComment,
                                    "Unterminated block comment",
                                    Some(&start),
                                )
                                .with_hint("Close the comment with */."));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let text = self.bump_while(is_ident_continue);
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }

    fn lex_number(&mut self) -> Result<TokenKind> {
        let start = self.here();
        let invalid = |text: &str| {
            TuffError::new(
                ErrorCode::LexInvalidNumber,
                format!("Invalid numeric literal '{text}'"),
                Some(&start),
            )
            .with_hint("Integer literals must fit in a signed 64-bit value.")
        };

        let radix = match (self.peek(), self.peek_n(1)) {
            (Some(b'0'), Some(b'x')) => Some(16),
            (Some(b'0'), Some(b'b')) => Some(2),
            (Some(b'0'), Some(b'o')) => Some(8),
            _ => None,
        };

        let mut is_float = false;
        let digits = if let Some(radix) = radix {
            self.bump();
            self.bump();
            let digits = self.bump_while(|byte| byte.is_ascii_hexdigit() || byte == b'_');
            if radix != 16 && digits.bytes().any(|byte| byte.is_ascii_alphabetic()) {
                return Err(invalid(digits));
            }
            digits.replace('_', "")
        } else {
            let mut text = self.bump_while(|byte| byte.is_ascii_digit() || byte == b'_').to_string();
            if self.peek() == Some(b'.') && self.peek_n(1).is_some_and(|byte| byte.is_ascii_digit()) {
                is_float = true;
                self.bump();
                text.push('.');
                text.push_str(self.bump_while(|byte| byte.is_ascii_digit() || byte == b'_'));
            }
            text.replace('_', "")
        };
        let suffix = self.bump_while(is_ident_continue).replace('_', "");

        if is_float {
            return digits
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| invalid(&digits));
        }

        let value = i64::from_str_radix(&digits, radix.unwrap_or(10)).map_err(|_| invalid(&digits))?;
        Ok(TokenKind::Number {
            value,
            suffix: (!suffix.is_empty()).then_some(suffix),
        })
    }

    /// Quoted text with escapes kept verbatim.
    fn lex_quoted(&mut self, quote: u8) -> Option<String> {
        self.bump();
        let start = self.pos;
        loop {
            match self.peek()? {
                b'\\' => {
                    self.bump();
                    self.bump()?;
                }
                byte if byte == quote => {
                    let text = self.input[start..self.pos].to_string();
                    self.bump();
                    return Some(text);
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn lex_string(&mut self) -> Result<TokenKind> {
        let start = self.here();
        self.lex_quoted(b'"').map(TokenKind::StringLiteral).ok_or_else(|| {
            TuffError::new(ErrorCode::LexUnterminatedString, "Unterminated string literal", Some(&start))
                .with_hint("Close the string with a matching double quote.")
        })
    }

    fn lex_char(&mut self) -> Result<TokenKind> {
        let start = self.here();
        self.lex_quoted(b'\'').map(TokenKind::CharLiteral).ok_or_else(|| {
            TuffError::new(ErrorCode::LexUnterminatedChar, "Unterminated char literal", Some(&start))
                .with_hint("Close the char literal with a matching single quote.")
        })
    }

    fn lex_symbol(&mut self, current: u8) -> Option<TokenKind> {
        let two = match (current, self.peek_n(1)) {
            (b'=', Some(b'>')) => Some(TokenKind::FatArrow),
            (b'=', Some(b'=')) => Some(TokenKind::EqEq),
            (b'!', Some(b'=')) => Some(TokenKind::NotEq),
            (b'<', Some(b'=')) => Some(TokenKind::Lte),
            (b'>', Some(b'=')) => Some(TokenKind::Gte),
            (b'&', Some(b'&')) => Some(TokenKind::AndAnd),
            (b'|', Some(b'|')) => Some(TokenKind::OrOr),
            (b'|', Some(b'>')) => Some(TokenKind::PipeGt),
            (b':', Some(b':')) => Some(TokenKind::ColonColon),
            (b'.', Some(b'.')) => Some(TokenKind::DotDot),
            _ => None,
        };
        if let Some(kind) = two {
            self.bump();
            self.bump();
            return Some(kind);
        }

        let kind = match current {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'=' => TokenKind::Eq,
            b'!' => TokenKind::Bang,
            b'?' => TokenKind::Question,
            b'|' => TokenKind::Pipe,
            b'&' => TokenKind::Amp,
            _ => return None,
        };
        self.bump();
        Some(kind)
    }
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_ident_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
