use lumenc_util::error::Located;
use lumenc_util::Span;
use thiserror::Error;

/// Lexical errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected byte {byte:#04x}")]
    UnexpectedByte { byte: u8, span: Span },

    #[error("malformed number literal: more than one '.'")]
    InvalidNumber { span: Span },

    #[error("unterminated string or char literal")]
    UnterminatedLiteral { span: Span },
}

impl Located for LexError {
    fn span(&self) -> Span {
        match self {
            LexError::UnexpectedByte { span, .. } => *span,
            LexError::InvalidNumber { span } => *span,
            LexError::UnterminatedLiteral { span } => *span,
        }
    }
}
