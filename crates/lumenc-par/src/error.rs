use lumenc_util::error::Located;
use lumenc_util::Span;
use thiserror::Error;

/// Parse errors. Each carries the one-line diagnostic the driver
/// prints verbatim.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("missing '{expected}'")]
    MissingCloser { expected: char, span: Span },

    #[error("illegal assignment target: left-hand side of '=' must be a variable")]
    IllegalAssignTarget { span: Span },

    #[error("assignment cannot be used as the right-hand side of another assignment")]
    NestedAssignRhs { span: Span },

    #[error("function declares more than 6 parameters")]
    TooManyParams { span: Span },

    #[error("lexical error: {0}")]
    Lex(#[from] lumenc_lex::LexError),
}

impl Located for ParseError {
    fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => *span,
            ParseError::MissingCloser { span, .. } => *span,
            ParseError::IllegalAssignTarget { span } => *span,
            ParseError::NestedAssignRhs { span } => *span,
            ParseError::TooManyParams { span } => *span,
            ParseError::Lex(e) => lumenc_util::error::Located::span(e),
        }
    }
}
