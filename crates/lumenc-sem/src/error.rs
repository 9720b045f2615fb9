use lumenc_util::error::Located;
use lumenc_util::{Span, ValueType};
use thiserror::Error;

/// Type-checking errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("type mismatch: cannot assign value of type {found} to variable of type {expected}")]
    AssignMismatch {
        expected: ValueType,
        found: ValueType,
        span: Span,
    },

    #[error("type mismatch: operands of types {left} and {right} are not compatible")]
    BinOpMismatch {
        left: ValueType,
        right: ValueType,
        span: Span,
    },

    #[error("operator '!' requires a bool operand, found {found}")]
    NotRequiresBool { found: ValueType, span: Span },

    #[error("unary '-' requires an integer or float operand, found {found}")]
    NegRequiresNumeric { found: ValueType, span: Span },

    #[error("use of uninitialized variable")]
    UninitializedVariable { span: Span },

    #[error("condition must be of type bool, found {found}")]
    ConditionNotBool { found: ValueType, span: Span },

    #[error("return type mismatch: function declares {expected}, returned {found}")]
    ReturnTypeMismatch {
        expected: ValueType,
        found: ValueType,
        span: Span,
    },

    #[error("call to undeclared function")]
    UndeclaredFunction { span: Span },

    #[error("function call passes {found} arguments, expected {expected}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("argument {index} has type {found}, expected {expected}")]
    ArgTypeMismatch {
        index: usize,
        expected: ValueType,
        found: ValueType,
        span: Span,
    },
}

impl Located for TypeError {
    fn span(&self) -> Span {
        match self {
            TypeError::AssignMismatch { span, .. } => *span,
            TypeError::BinOpMismatch { span, .. } => *span,
            TypeError::NotRequiresBool { span, .. } => *span,
            TypeError::NegRequiresNumeric { span, .. } => *span,
            TypeError::UninitializedVariable { span } => *span,
            TypeError::ConditionNotBool { span, .. } => *span,
            TypeError::ReturnTypeMismatch { span, .. } => *span,
            TypeError::UndeclaredFunction { span } => *span,
            TypeError::ArityMismatch { span, .. } => *span,
            TypeError::ArgTypeMismatch { span, .. } => *span,
        }
    }
}
