//! lumenc-lex - the lexical analyzer.
//!
//! Converts a source buffer into a stream of [`Token`]s with one token of
//! lookahead. The lexer borrows from the source for the lifetime of the
//! token stream and never allocates.

mod cursor;
mod error;
mod lexer;
mod token;

pub use error::LexError;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token, TokenKind};
