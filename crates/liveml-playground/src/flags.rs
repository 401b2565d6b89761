//! Code-block flags.
//!
//! A live snippet is declared by words in the metastring of its code
//! fence, for example ```` ```reason edit noexec ````. Words that are not
//! flags (line highlight ranges, titles) are ignored.

use log::debug;
use serde::{Deserialize, Serialize};

/// Surface id used by a bare `canvas` flag.
pub const DEFAULT_CANVAS: &str = "canvas";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    /// The editor accepts changes and shows an execute button.
    pub edit: bool,
    /// Do not run the snippet when it is mounted.
    pub noexec: bool,
    /// Run, but show only side effects: no editor and no value echo.
    pub hidden: bool,
    /// Display and run once, read-only.
    pub demo: bool,
    /// Id of the drawing surface reserved for this block.
    pub canvas: Option<String>,
}

impl Flags {
    pub fn parse(metastring: &str) -> Self {
        let mut flags = Self::default();
        for word in metastring.split_whitespace() {
            let (key, value) = match word.split_once('=') {
                Some((key, value)) => (key, Some(value.trim_matches('"'))),
                None => (word, None),
            };
            match key {
                "edit" => flags.edit = true,
                "noexec" => flags.noexec = true,
                "hidden" => flags.hidden = true,
                "demo" => flags.demo = true,
                // A broken example: editable, but it must not run until fixed.
                "fix" => {
                    flags.edit = true;
                    flags.noexec = true;
                }
                "canvas" => {
                    let id = value.filter(|v| !v.is_empty()).unwrap_or(DEFAULT_CANVAS);
                    flags.canvas = Some(id.to_string());
                }
                _ => debug!("ignoring code block option '{word}'"),
            }
        }
        flags
    }

    /// Blocks without any flag are plain highlighted code.
    pub fn is_live(&self) -> bool {
        self.edit || self.noexec || self.hidden || self.demo || self.canvas.is_some()
    }

    pub fn runs_on_mount(&self) -> bool {
        !self.noexec
    }

    pub fn is_editable(&self) -> bool {
        self.edit
    }
}
