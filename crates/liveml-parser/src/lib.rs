//! LiveML parser: converts a token stream in either surface syntax into
//! the shared AST.

mod parse_item;
mod parse_ml;
mod parse_pattern;
mod parse_reason;
mod parse_type;
mod parser;

pub use parser::{ParseResult, Parser};

use liveml_lexer::Lexer;
use liveml_types::{SourceFile, Syntax};

/// Lex and parse a snippet in one step.
///
/// Lexer errors are reported together with parser errors; the program is
/// only returned when both stages succeed.
pub fn parse(source_file: &SourceFile, syntax: Syntax) -> ParseResult {
    let lexed = Lexer::new(source_file, syntax).lex();
    let mut result = Parser::new(lexed.tokens, source_file, syntax).parse();
    if lexed.errors.has_errors() {
        let mut errors = lexed.errors;
        errors.extend(result.errors);
        result.errors = errors;
        result.program = None;
    }
    result
}
