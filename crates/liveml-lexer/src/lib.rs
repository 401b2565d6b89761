//! LiveML lexer: converts source text in either surface syntax into a
//! token stream.

pub mod lexer;
pub mod token;

pub use lexer::{LexResult, Lexer};
pub use token::{Token, TokenKind};
