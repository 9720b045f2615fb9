//! The lexer: a single-lookahead tokenizer over a byte buffer.

use lumenc_util::Span;

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{keyword_from_ident, Token, TokenKind};

/// Tokenizes a source buffer one token of lookahead at a time.
///
/// `Lexer` owns nothing but the cursor and the currently-buffered token; it
/// never allocates. `peek` inspects the buffered token, `advance` discards
/// it and scans the next one.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
    current: Token<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Result<Self, LexError> {
        let mut cursor = Cursor::new(source);
        let current = scan_token(&mut cursor)?;
        Ok(Self { cursor, current })
    }

    /// Returns the current token without consuming it.
    pub fn peek(&self) -> Token<'a> {
        self.current
    }

    /// Discards the current token, scans the next, and returns it.
    pub fn advance(&mut self) -> Result<Token<'a>, LexError> {
        let next = scan_token(&mut self.cursor)?;
        self.current = next;
        Ok(next)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn skip_whitespace(cursor: &mut Cursor<'_>) {
    loop {
        match cursor.current() {
            b' ' | b'\t' | b'\r' | b'\n' => {
                cursor.advance();
            }
            _ => break,
        }
    }
}

fn scan_token<'a>(cursor: &mut Cursor<'a>) -> Result<Token<'a>, LexError> {
    skip_whitespace(cursor);

    let start = cursor.position();
    let start_line = cursor.line();
    let start_column = cursor.column();
    let span_from = |cursor: &Cursor<'_>| {
        Span::new(
            start as u32,
            cursor.position() as u32,
            start_line,
            start_column,
        )
    };

    if cursor.is_at_end() || cursor.current() == 0 {
        return Ok(Token::new(TokenKind::Eof, span_from(cursor)));
    }

    let byte = cursor.current();

    macro_rules! single {
        ($kind:expr) => {{
            cursor.advance();
            Token::new($kind, span_from(cursor))
        }};
    }

    macro_rules! one_or_two {
        ($second:literal, $two_kind:expr, $one_kind:expr) => {{
            cursor.advance();
            if cursor.current() == $second {
                cursor.advance();
                Token::new($two_kind, span_from(cursor))
            } else {
                Token::new($one_kind, span_from(cursor))
            }
        }};
    }

    let token = match byte {
        b'(' => single!(TokenKind::LParen),
        b')' => single!(TokenKind::RParen),
        b'{' => single!(TokenKind::LBrace),
        b'}' => single!(TokenKind::RBrace),
        b',' => single!(TokenKind::Comma),
        b';' => single!(TokenKind::Semicolon),
        b'+' => single!(TokenKind::Plus),
        b'-' => single!(TokenKind::Minus),
        b'*' => single!(TokenKind::Star),
        b'/' => single!(TokenKind::Slash),
        b'%' => single!(TokenKind::Percent),

        b'=' => one_or_two!(b'=', TokenKind::EqEq, TokenKind::Eq),
        b'!' => one_or_two!(b'=', TokenKind::Neq, TokenKind::Bang),
        b'<' => one_or_two!(b'=', TokenKind::Le, TokenKind::Lt),
        b'>' => one_or_two!(b'=', TokenKind::Ge, TokenKind::Gt),

        b'"' => scan_quoted(cursor, b'"', TokenKind::Str, span_from)?,
        b'\'' => scan_quoted(cursor, b'\'', TokenKind::Char, span_from)?,

        b'0'..=b'9' => scan_number(cursor, span_from)?,

        b if is_ident_start(b) => scan_ident(cursor, span_from),

        other => {
            cursor.advance();
            return Err(LexError::UnexpectedByte {
                byte: other,
                span: span_from(cursor),
            });
        }
    };

    Ok(token)
}

fn scan_quoted<'a>(
    cursor: &mut Cursor<'a>,
    quote: u8,
    make_kind: impl FnOnce(&'a str) -> TokenKind<'a>,
    span_from: impl Fn(&Cursor<'_>) -> Span,
) -> Result<Token<'a>, LexError> {
    let lexeme_start = cursor.position();
    cursor.advance(); // opening quote

    loop {
        if cursor.is_at_end() || cursor.current() == 0 {
            return Err(LexError::UnterminatedLiteral {
                span: span_from(cursor),
            });
        }
        let b = cursor.advance();
        if b == quote {
            break;
        }
    }

    let text = cursor.slice_from(lexeme_start);
    Ok(Token::new(make_kind(text), span_from(cursor)))
}

fn scan_number<'a>(
    cursor: &mut Cursor<'a>,
    span_from: impl Fn(&Cursor<'_>) -> Span,
) -> Result<Token<'a>, LexError> {
    let lexeme_start = cursor.position();
    let mut dot_count = 0u32;

    while cursor.current().is_ascii_digit() {
        cursor.advance();
    }

    while cursor.current() == b'.' {
        dot_count += 1;
        if dot_count > 1 {
            return Err(LexError::InvalidNumber {
                span: span_from(cursor),
            });
        }
        cursor.advance();
        while cursor.current().is_ascii_digit() {
            cursor.advance();
        }
    }

    let text = cursor.slice_from(lexeme_start);
    let kind = if dot_count == 0 {
        TokenKind::Int(text)
    } else {
        TokenKind::Float(text)
    };
    Ok(Token::new(kind, span_from(cursor)))
}

fn scan_ident<'a>(
    cursor: &mut Cursor<'a>,
    span_from: impl Fn(&Cursor<'_>) -> Span,
) -> Token<'a> {
    let lexeme_start = cursor.position();
    while is_ident_continue(cursor.current()) {
        cursor.advance();
    }
    let text = cursor.slice_from(lexeme_start);
    let kind = keyword_from_ident(text).unwrap_or(TokenKind::Ident(text));
    Token::new(kind, span_from(cursor))
}
