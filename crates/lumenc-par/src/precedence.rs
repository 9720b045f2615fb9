//! The precedence table shared by both expression-parsing algorithms:
//! higher binds tighter.

use crate::ast::BinOpKind;
use lumenc_lex::TokenKind;

/// Precedence of the right-associative assignment operator. Lower than
/// every binary operator.
pub const ASSIGN_PREC: u8 = 1;

pub fn binop_prec(op: BinOpKind) -> u8 {
    match op {
        BinOpKind::Lt
        | BinOpKind::Le
        | BinOpKind::Gt
        | BinOpKind::Ge
        | BinOpKind::Eq
        | BinOpKind::Neq => 2,
        BinOpKind::Add | BinOpKind::Sub => 3,
        BinOpKind::Mul | BinOpKind::Div | BinOpKind::Mod => 4,
    }
}

/// Maps a token to the `BinOpKind` it introduces, if any. Does not include
/// `=`, which is handled separately (lifted out before descent).
pub fn binop_from_token(kind: TokenKind<'_>) -> Option<BinOpKind> {
    Some(match kind {
        TokenKind::EqEq => BinOpKind::Eq,
        TokenKind::Neq => BinOpKind::Neq,
        TokenKind::Lt => BinOpKind::Lt,
        TokenKind::Le => BinOpKind::Le,
        TokenKind::Gt => BinOpKind::Gt,
        TokenKind::Ge => BinOpKind::Ge,
        TokenKind::Plus => BinOpKind::Add,
        TokenKind::Minus => BinOpKind::Sub,
        TokenKind::Star => BinOpKind::Mul,
        TokenKind::Slash => BinOpKind::Div,
        TokenKind::Percent => BinOpKind::Mod,
        _ => return None,
    })
}
