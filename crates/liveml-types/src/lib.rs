//! Shared types for LiveML.
//!
//! This crate defines the abstract syntax shared by both surface syntaxes,
//! source spans, the [`Syntax`] tag and the structured syntax error type
//! used by every stage of the playground pipeline.

mod error;
mod span;
mod syntax;
pub mod ast;

pub use error::{Diagnostics, ErrorCategory, ErrorCode, LiveError, MAX_ERRORS};
pub use span::{SourceFile, Span};
pub use syntax::{Syntax, UnknownSyntax};

/// Result type used by the front end.
pub type Result<T> = std::result::Result<T, LiveError>;
