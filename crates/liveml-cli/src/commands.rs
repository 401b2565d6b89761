//! One-shot subcommands.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use liveml_eval::UnitOutput;
use liveml_playground::{Evaluate, PlaygroundConfig, SessionHandle};
use liveml_transform::TransformError;
use liveml_types::Syntax;
use log::info;

fn read(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

pub fn run(file: &Path, syntax: Syntax, json: bool, config: &PlaygroundConfig) -> Result<()> {
    let source = read(file)?;
    let canonical = liveml_transform::to_canonical(&source, syntax)?;
    let mut session = SessionHandle::spawn(config)?;
    let outputs = session.execute(&canonical, syntax)?;
    info!("{} ran {} unit(s)", file.display(), outputs.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        let mut stdout = std::io::stdout().lock();
        let mut stderr = std::io::stderr().lock();
        for output in &outputs {
            print_unit(output, &mut stdout, &mut stderr)?;
        }
    }

    let failed = outputs.iter().filter(|o| !o.stderr.is_empty()).count();
    if failed > 0 {
        bail!("{failed} of {} unit(s) reported errors", outputs.len());
    }
    Ok(())
}

/// Value, printed text, then errors, each ending in a newline.
pub fn print_unit(output: &UnitOutput, out: &mut impl Write, err: &mut impl Write) -> Result<()> {
    if !output.value.is_empty() {
        writeln!(out, "{}", output.value)?;
    }
    out.write_all(output.stdout.as_bytes())?;
    if !output.stdout.is_empty() && !output.stdout.ends_with('\n') {
        writeln!(out)?;
    }
    if !output.stderr.is_empty() {
        err.write_all(output.stderr.as_bytes())?;
        if !output.stderr.ends_with('\n') {
            writeln!(err)?;
        }
    }
    Ok(())
}

pub fn convert(file: &Path, from: Syntax, to: Syntax) -> Result<()> {
    let source = read(file)?;
    let canonical = liveml_transform::to_canonical(&source, from)?;
    let converted = liveml_transform::to_surface(&canonical, to)?;
    print!("{converted}");
    if !converted.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn check(file: &Path, syntax: Syntax, json: bool) -> Result<()> {
    let source = read(file)?;
    match liveml_transform::parse(&source, syntax) {
        Ok(program) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&liveml_types::Diagnostics::empty())?);
            } else {
                println!("{}: ok ({} item(s))", file.display(), program.items.len());
            }
            Ok(())
        }
        Err(TransformError::Syntax(errors)) if json => {
            println!("{}", serde_json::to_string_pretty(&errors)?);
            bail!("{} syntax error(s)", errors.total_errors)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(output: &UnitOutput) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        print_unit(output, &mut out, &mut err).unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    #[test]
    fn test_print_unit_channels() {
        let output = UnitOutput {
            value: "43".into(),
            stdout: "hi".into(),
            stderr: "Exception: Exit.".into(),
        };
        assert_eq!(
            printed(&output),
            ("43\nhi\n".to_string(), "Exception: Exit.\n".to_string())
        );
    }

    #[test]
    fn test_print_empty_unit() {
        assert_eq!(printed(&UnitOutput::default()), (String::new(), String::new()));
    }
}
