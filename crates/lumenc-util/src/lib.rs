//! lumenc-util - shared plumbing for the lumenc compiler workspace.
//!
//! This crate carries the types every pipeline stage needs but none of them
//! owns: source spans, the identifier interner, the closed `ValueType` set,
//! and the error plumbing each downstream crate builds its own `thiserror`
//! enum on top of.

pub mod error;
pub mod span;
pub mod symbol;
pub mod types;

pub use span::{FileId, Span};
pub use symbol::{Interner, Symbol};
pub use types::ValueType;
