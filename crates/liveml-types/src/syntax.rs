use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two concrete surface syntaxes of the language.
///
/// `Ml` is the canonical syntax: every snippet is converted to it before
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// OCaml-style syntax (`let x = 1;;`, `fun x -> x`).
    #[default]
    Ml,
    /// Reason-style syntax (`let x = 1;`, `x => x`).
    Reason,
}

impl Syntax {
    pub const CANONICAL: Syntax = Syntax::Ml;

    pub fn is_canonical(self) -> bool {
        self == Self::CANONICAL
    }

    /// Conventional file extension for snippets in this syntax.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ml => "ml",
            Self::Reason => "re",
        }
    }

    /// Guess the syntax from a file name's extension.
    pub fn from_path(path: &str) -> Option<Syntax> {
        let ext = path.rsplit_once('.')?.1;
        ext.parse().ok()
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ml => write!(f, "ml"),
            Self::Reason => write!(f, "reason"),
        }
    }
}

/// A syntax tag that names neither surface syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown syntax '{0}' (expected 'ml' or 'reason')")]
pub struct UnknownSyntax(pub String);

impl FromStr for Syntax {
    type Err = UnknownSyntax;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ml" | "ocaml" | "mli" => Ok(Self::Ml),
            "re" | "reason" | "reasonml" => Ok(Self::Reason),
            _ => Err(UnknownSyntax(s.to_string())),
        }
    }
}
