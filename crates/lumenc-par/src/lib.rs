//! lumenc-par - the parser.
//!
//! Produces an [`ast::Ast`] from a source buffer via one of two equivalent
//! expression-parsing algorithms (see [`parser::Algorithm`]).

pub mod ast;
mod error;
mod parser;
mod precedence;

pub use error::ParseError;
pub use parser::{Algorithm, Parser, MAX_PARAMS};
