//! What a playground shows after a run.
//!
//! A run produces an ordered list of [`OutputBlock`]s. Error blocks are
//! flagged so a front end can style them apart from values and printed
//! text; nothing that went wrong is dropped.

use liveml_types::Syntax;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum OutputBlock {
    /// The printed value of a unit.
    Echo(String),
    Stdout(String),
    Stderr(String),
    /// The snippet does not parse in its own syntax.
    SyntaxError(String),
    /// The snippet parsed but could not be converted for evaluation.
    ConversionError(String),
    /// The session cannot run anything.
    SessionError(String),
    /// An SVG document drawn by the snippet.
    Graphic(String),
}

impl OutputBlock {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Stderr(_) | Self::SyntaxError(_) | Self::ConversionError(_) | Self::SessionError(_)
        )
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Echo(text)
            | Self::Stdout(text)
            | Self::Stderr(text)
            | Self::SyntaxError(text)
            | Self::ConversionError(text)
            | Self::SessionError(text)
            | Self::Graphic(text) => text,
        }
    }
}

/// A drawing surface reserved by the `canvas` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub id: String,
    /// Every graphic drawn during the last run, oldest first.
    pub graphics: Vec<String>,
}

/// Snapshot of a playground for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub syntax: Syntax,
    /// Editor text, `None` for hidden blocks.
    pub editor: Option<String>,
    pub editable: bool,
    /// Present whenever the block reserves a canvas, even if nothing was
    /// drawn on it.
    pub canvas: Option<Canvas>,
    pub blocks: Vec<OutputBlock>,
}

impl Display {
    pub fn has_errors(&self) -> bool {
        self.blocks.iter().any(OutputBlock::is_error)
    }

    /// All block text in order, for consoles and other plain displays.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            let text = block.text();
            if text.is_empty() {
                continue;
            }
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

/// Split printed text into text blocks and the SVG documents drawn
/// between them.
///
/// A document starts on a line beginning with `<svg` and ends on the
/// first line ending with `</svg>`. An unterminated document stays text.
pub fn split_stdout(stdout: &str) -> Vec<OutputBlock> {
    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut graphic: Option<String> = None;

    for line in stdout.split_inclusive('\n') {
        match graphic.as_mut() {
            Some(svg) => svg.push_str(line),
            None if line.starts_with("<svg") => graphic = Some(line.to_string()),
            None => {
                text.push_str(line);
                continue;
            }
        }
        if line.trim_end().ends_with("</svg>") {
            if let Some(svg) = graphic.take() {
                if !text.is_empty() {
                    blocks.push(OutputBlock::Stdout(std::mem::take(&mut text)));
                }
                blocks.push(OutputBlock::Graphic(svg.trim_end().to_string()));
            }
        }
    }

    if let Some(unfinished) = graphic {
        text.push_str(&unfinished);
    }
    if !text.is_empty() {
        blocks.push(OutputBlock::Stdout(text));
    }
    blocks
}
