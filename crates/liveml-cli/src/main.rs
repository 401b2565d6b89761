// liveml: run, convert and check LiveML snippets from the command line.
//
// Subcommands:
//   run      execute a file against a fresh session
//   convert  print a file in the other surface syntax
//   check    report syntax errors without running anything
//   repl     interactive session on stdin

mod commands;
mod repl;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use liveml_playground::PlaygroundConfig;
use liveml_types::Syntax;
use log::debug;

#[derive(Parser)]
#[command(name = "liveml", version, about = "LiveML snippet runner and converter")]
struct Cli {
    /// JSON playground configuration (limits, default syntax, worker stack)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Execute a snippet file and print each unit's output
    Run {
        file: PathBuf,
        /// Source syntax; guessed from the file extension when omitted
        #[arg(long)]
        syntax: Option<Syntax>,
        /// Print the unit records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert a snippet file to another syntax
    Convert {
        file: PathBuf,
        /// Target syntax
        #[arg(long)]
        to: Syntax,
        /// Source syntax; guessed from the file extension when omitted
        #[arg(long)]
        from: Option<Syntax>,
    },
    /// Parse a snippet file and report syntax errors
    Check {
        file: PathBuf,
        #[arg(long)]
        syntax: Option<Syntax>,
        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start an interactive session
    Repl {
        #[arg(long)]
        syntax: Option<Syntax>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Cmd::Run { file, syntax, json } => {
            let syntax = syntax_for(&file, syntax, &config);
            commands::run(&file, syntax, json, &config)
        }
        Cmd::Convert { file, to, from } => {
            let from = syntax_for(&file, from, &config);
            commands::convert(&file, from, to)
        }
        Cmd::Check { file, syntax, json } => {
            let syntax = syntax_for(&file, syntax, &config);
            commands::check(&file, syntax, json)
        }
        Cmd::Repl { syntax } => repl::run(syntax.unwrap_or(config.syntax), &config),
    }
}

fn load_config(path: Option<&Path>) -> Result<PlaygroundConfig> {
    let Some(path) = path else {
        return Ok(PlaygroundConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = PlaygroundConfig::from_json(&text)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    debug!("loaded config from {}", path.display());
    Ok(config)
}

/// The explicit syntax, else the file extension's, else the configured
/// default.
fn syntax_for(file: &Path, explicit: Option<Syntax>, config: &PlaygroundConfig) -> Syntax {
    explicit
        .or_else(|| file.to_str().and_then(Syntax::from_path))
        .unwrap_or(config.syntax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_precedence() {
        let config = PlaygroundConfig::default();
        assert_eq!(syntax_for(Path::new("a.ml"), None, &config), Syntax::Ml);
        assert_eq!(syntax_for(Path::new("a.re"), None, &config), Syntax::Reason);
        assert_eq!(
            syntax_for(Path::new("a.re"), Some(Syntax::Ml), &config),
            Syntax::Ml
        );
        assert_eq!(syntax_for(Path::new("notes.txt"), None, &config), config.syntax);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["liveml", "convert", "x.re", "--to", "ml"]).unwrap();
        assert!(matches!(cli.command, Cmd::Convert { to: Syntax::Ml, from: None, .. }));
        assert!(Cli::try_parse_from(["liveml", "run", "x.ml", "--syntax", "js"]).is_err());
    }
}
