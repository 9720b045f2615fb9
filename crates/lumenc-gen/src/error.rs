use lumenc_util::error::Located;
use lumenc_util::Span;
use thiserror::Error;

/// Code generation errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodegenError {
    #[error("global initializer must be a compile-time constant")]
    NonConstantGlobal { span: Span },

    #[error("float constant folding is not supported")]
    FloatFoldUnsupported { span: Span },

    #[error("ran out of caller-saved registers for this expression")]
    OutOfCallerSavedRegisters { span: Span },

    #[error("ran out of callee-saved registers for this expression")]
    OutOfCalleeSavedRegisters { span: Span },

    #[error("function call passes {0} arguments, only 6 are supported")]
    TooManyArguments(usize, Span),

    #[error("modulus is not yet implemented")]
    ModulusUnimplemented { span: Span },

    #[error("floating-point arithmetic is not yet implemented")]
    FloatArithmeticUnimplemented { span: Span },
}

impl Located for CodegenError {
    fn span(&self) -> Span {
        match self {
            CodegenError::NonConstantGlobal { span } => *span,
            CodegenError::FloatFoldUnsupported { span } => *span,
            CodegenError::OutOfCallerSavedRegisters { span } => *span,
            CodegenError::OutOfCalleeSavedRegisters { span } => *span,
            CodegenError::TooManyArguments(_, span) => *span,
            CodegenError::ModulusUnimplemented { span } => *span,
            CodegenError::FloatArithmeticUnimplemented { span } => *span,
        }
    }
}
