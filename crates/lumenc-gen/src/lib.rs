//! lumenc-gen - the code generator.
//!
//! Walks a type-checked [`lumenc_par::ast::Ast`] and emits NASM-syntax text
//! for Linux/SysV x86-64, assuming an external `printf` for `main`'s result
//! printout.

mod annotate;
mod emit;
mod error;
mod layout;
mod registers;

pub use emit::CodeGenerator;
pub use error::CodegenError;
