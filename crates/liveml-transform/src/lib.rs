//! LiveML syntax transform.
//!
//! Snippets are always evaluated in the canonical ML syntax. This crate
//! converts Reason snippets to ML and back by parsing into the shared AST
//! and pretty-printing in the other syntax.
//!
//! Printing is deterministic and normalising: layout and comments are not
//! preserved, so two snippets are considered equivalent when they print
//! the same. Every conversion re-parses its own output and fails with
//! [`TransformError::Conversion`] unless the printed text is stable.

mod error;
mod layout;
mod print_ml;
mod print_reason;

pub use error::{TransformError, TransformResult};

use liveml_types::ast::Program;
use liveml_types::{SourceFile, Syntax};

/// Parse `source` in `syntax`, returning every syntax error on failure.
pub fn parse(source: &str, syntax: Syntax) -> TransformResult<Program> {
    let source_file = SourceFile::new(format!("snippet.{}", syntax.extension()), source);
    let result = liveml_parser::parse(&source_file, syntax);
    match result.program {
        Some(program) if !result.errors.has_errors() => Ok(program),
        _ => Err(TransformError::Syntax(result.errors)),
    }
}

/// Pretty-print a program in `syntax`.
pub fn print(program: &Program, syntax: Syntax) -> String {
    match syntax {
        Syntax::Ml => print_ml::print_program(program),
        Syntax::Reason => print_reason::print_program(program),
    }
}

/// Convert a snippet written in `syntax` to canonical ML.
///
/// ML input is validated and returned unchanged.
pub fn to_canonical(source: &str, syntax: Syntax) -> TransformResult<String> {
    let program = parse(source, syntax)?;
    if syntax.is_canonical() {
        return Ok(source.to_string());
    }
    let canonical = print_checked(&program, Syntax::CANONICAL)?;
    log::debug!(
        "converted {} lines of {syntax} to {} lines of ml",
        source.lines().count(),
        canonical.lines().count()
    );
    Ok(canonical)
}

/// Convert canonical ML back into `syntax`.
///
/// Converting to ML returns the validated input unchanged.
pub fn to_surface(canonical: &str, syntax: Syntax) -> TransformResult<String> {
    let program = parse(canonical, Syntax::CANONICAL)?;
    if syntax.is_canonical() {
        return Ok(canonical.to_string());
    }
    let surface = print_checked(&program, syntax)?;
    log::debug!("converted canonical snippet to {syntax}");
    Ok(surface)
}

/// Parse and re-print in the same syntax.
///
/// Two snippets are equivalent exactly when their normal forms are equal.
pub fn normalize(source: &str, syntax: Syntax) -> TransformResult<String> {
    let program = parse(source, syntax)?;
    print_checked(&program, syntax)
}

/// Print `program` in `target` and verify the text parses back to a
/// program that prints identically.
fn print_checked(program: &Program, target: Syntax) -> TransformResult<String> {
    let printed = print(program, target);
    let reparsed = match parse(&printed, target) {
        Ok(reparsed) => reparsed,
        Err(TransformError::Syntax(errors)) => {
            let message = errors
                .first()
                .map(|e| format!("printed text does not parse: {}", e.message))
                .unwrap_or_else(|| "printed text does not parse".to_string());
            log::warn!("{target} printer produced unparsable output: {message}");
            return Err(TransformError::conversion(target, message));
        }
        Err(other) => return Err(other),
    };
    if print(&reparsed, target) != printed {
        log::warn!("{target} printer output is not stable under re-parsing");
        return Err(TransformError::conversion(
            target,
            "printed text does not read back as the same program",
        ));
    }
    Ok(printed)
}
