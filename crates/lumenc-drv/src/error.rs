use std::path::PathBuf;

use lumenc_util::error::Located;
use lumenc_util::Span;
use thiserror::Error;

/// The driver's aggregate error type: one variant per upstream
/// pipeline stage plus `Io`, so `main` has exactly one place to turn a
/// failure into a diagnostic line and an exit code.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] lumenc_par::ParseError),

    #[error(transparent)]
    Type(#[from] lumenc_sem::TypeError),

    #[error(transparent)]
    Codegen(#[from] lumenc_gen::CodegenError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Located for CompileError {
    fn span(&self) -> Span {
        match self {
            CompileError::Parse(e) => e.span(),
            CompileError::Type(e) => e.span(),
            CompileError::Codegen(e) => e.span(),
            CompileError::Io { .. } => Span::DUMMY,
        }
    }
}
