//! SQL lexer.
//!
//! A small hand-written tokenizer used to canonicalize complex filters and to
//! scan `CREATE TABLE` text read back from the catalog.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
