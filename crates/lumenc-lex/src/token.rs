//! Token definitions.
//!
//! A token's payload is a borrowed slice of the source buffer for
//! identifiers and literal lexemes; the lexer never allocates.

use lumenc_util::{Span, ValueType};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenKind<'a> {
    Eof,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    // Operators
    Eq,
    EqEq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    // Literals
    Int(&'a str),
    Float(&'a str),
    Str(&'a str),
    Char(&'a str),
    True,
    False,

    // Keywords
    If,
    Else,
    While,
    Return,
    Type(ValueType),

    Ident(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind<'a>, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Maps an identifier lexeme to its keyword token, if it is one of the
/// reserved words. Returns `None` for an ordinary identifier.
pub fn keyword_from_ident(ident: &str) -> Option<TokenKind<'static>> {
    Some(match ident {
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "bool" => TokenKind::Type(ValueType::Bool),
        "char" => TokenKind::Type(ValueType::Char),
        "str" => TokenKind::Type(ValueType::Str),
        "i16" => TokenKind::Type(ValueType::I16),
        "i32" => TokenKind::Type(ValueType::I32),
        "i64" => TokenKind::Type(ValueType::I64),
        "f32" => TokenKind::Type(ValueType::F32),
        "f64" => TokenKind::Type(ValueType::F64),
        _ => return None,
    })
}
