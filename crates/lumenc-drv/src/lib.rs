//! lumenc-drv - the CLI driver.
//!
//! Orchestrates the four pipeline stages in order — parse, type check,
//! generate — and writes the assembly output only once every stage has
//! succeeded. A failure at any stage short-circuits via `?` and is handed
//! back to `main` as a single [`CompileError`].

mod config;
mod error;

pub use config::{Config, DEFAULT_OUTPUT};
pub use error::CompileError;

use lumenc_gen::CodeGenerator;
use lumenc_par::{Algorithm, Parser};
use lumenc_sem::TypeChecker;
use lumenc_util::Interner;

/// Runs the full pipeline for `config`: read, parse, type check, generate,
/// write. No partial output is ever written — the file is created only on
/// the final, successful line of this function.
pub fn run(config: &Config) -> Result<(), CompileError> {
    log::debug!("reading source from {}", config.input.display());
    let source = std::fs::read_to_string(&config.input).map_err(|source| CompileError::Io {
        path: config.input.clone(),
        source,
    })?;

    let mut interner = Interner::new();

    log::debug!("parsing");
    let mut parser = Parser::new(&source, &mut interner, Algorithm::PrecedenceClimbing)?;
    let mut ast = parser.parse()?;

    log::debug!("type checking");
    TypeChecker::new().check_program(&mut ast)?;

    log::debug!("generating code");
    let asm = CodeGenerator::new(&interner).generate(&mut ast)?;

    log::debug!("writing output to {}", config.output.display());
    std::fs::write(&config.output, asm).map_err(|source| CompileError::Io {
        path: config.output.clone(),
        source,
    })?;

    Ok(())
}
