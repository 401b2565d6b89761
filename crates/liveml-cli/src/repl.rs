//! Interactive session on stdin.
//!
//! Lines are collected until they form a complete phrase: the input ends
//! with the syntax's terminator (`;;` for ML, `;` for Reason) outside any
//! bracket, or a blank line is entered. `#reset` and `#quit` are handled
//! here and never reach the session.

use std::io::{BufRead, Write};

use anyhow::Result;
use liveml_playground::{Evaluate, PlaygroundConfig, SessionHandle};
use liveml_types::Syntax;

use crate::commands::print_unit;

pub fn run(syntax: Syntax, config: &PlaygroundConfig) -> Result<()> {
    let mut session = SessionHandle::spawn(config)?;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    println!("LiveML {} ({syntax}). #reset clears the session, #quit exits.", env!("CARGO_PKG_VERSION"));
    let mut buffer = String::new();
    loop {
        print!("{}", if buffer.is_empty() { "# " } else { "  " });
        stdout.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "#quit" | "#exit" => break,
            "#reset" => {
                buffer.clear();
                if let Err(e) = session.reset() {
                    writeln!(stderr, "{e}")?;
                }
                continue;
            }
            "" if buffer.trim().is_empty() => continue,
            "" => {}
            _ => {
                buffer.push_str(&line);
                if !is_complete(&buffer, syntax) {
                    continue;
                }
            }
        }

        let phrase = std::mem::take(&mut buffer);
        let canonical = match liveml_transform::to_canonical(&phrase, syntax) {
            Ok(canonical) => canonical,
            Err(e) => {
                writeln!(stderr, "{e}")?;
                continue;
            }
        };
        match session.execute(&canonical, syntax) {
            Ok(outputs) => {
                for output in &outputs {
                    print_unit(output, &mut stdout, &mut stderr)?;
                }
            }
            Err(e) => writeln!(stderr, "{e}")?,
        }
    }
    Ok(())
}

/// Whether `text` ends a phrase: the terminator follows the last token
/// and every bracket is closed. Brackets inside string and char literals
/// are not counted.
pub fn is_complete(text: &str, syntax: Syntax) -> bool {
    let terminator = match syntax {
        Syntax::Ml => ";;",
        Syntax::Reason => ";",
    };
    if !text.trim_end().ends_with(terminator) {
        return false;
    }

    let mut depth = 0i32;
    let mut in_string = false;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_string => {
                chars.next();
            }
            '"' => in_string = !in_string,
            '(' | '[' | '{' if !in_string => depth += 1,
            ')' | ']' | '}' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth <= 0 && !in_string
}
