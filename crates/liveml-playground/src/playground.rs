//! The controller behind one live code block.

use liveml_eval::{SessionError, UnitOutput};
use liveml_transform::TransformError;
use liveml_types::Syntax;
use log::debug;

use crate::backend::Evaluate;
use crate::flags::Flags;
use crate::output::{split_stdout, Canvas, Display, OutputBlock};

/// A mounted code block.
///
/// Edits only change the draft. Nothing runs until [`execute`] is called,
/// apart from the single run at mount for blocks without `noexec`.
///
/// [`execute`]: Playground::execute
pub struct Playground<E: Evaluate> {
    backend: E,
    syntax: Syntax,
    flags: Flags,
    mounted: String,
    draft: String,
    blocks: Vec<OutputBlock>,
    graphics: Vec<String>,
}

impl<E: Evaluate> Playground<E> {
    pub fn mount(backend: E, code: &str, syntax: Syntax, flags: Flags) -> Self {
        let code = code.trim().to_string();
        let mut playground = Self {
            backend,
            syntax,
            flags,
            draft: code.clone(),
            mounted: code,
            blocks: Vec::new(),
            graphics: Vec::new(),
        };
        if playground.flags.runs_on_mount() {
            playground.execute();
        }
        playground
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn backend(&self) -> &E {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut E {
        &mut self.backend
    }

    /// Replace the draft. Returns `false`, leaving the draft alone, for
    /// blocks that are not editable.
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        if !self.flags.is_editable() {
            debug!("ignoring edit of a read-only block");
            return false;
        }
        self.draft = text.into();
        true
    }

    /// Convert and run the draft, replacing the previous output.
    pub fn execute(&mut self) {
        self.blocks.clear();
        self.graphics.clear();

        let canonical = match liveml_transform::to_canonical(&self.draft, self.syntax) {
            Ok(canonical) => canonical,
            Err(TransformError::Syntax(errors)) => {
                self.blocks.push(OutputBlock::SyntaxError(errors.to_string()));
                return;
            }
            Err(e @ TransformError::Conversion { .. }) => {
                self.blocks.push(OutputBlock::ConversionError(e.to_string()));
                return;
            }
        };

        match self.backend.execute(&canonical, self.syntax) {
            Ok(outputs) => {
                for output in outputs {
                    self.push_unit(output);
                }
            }
            Err(SessionError::Syntax(errors)) => {
                // The draft already parsed, so this is the conversion's fault.
                self.blocks
                    .push(OutputBlock::ConversionError(errors.to_string()));
            }
            Err(e @ SessionError::Unavailable(_)) => {
                self.blocks.push(OutputBlock::SessionError(e.to_string()));
            }
        }
    }

    fn push_unit(&mut self, output: UnitOutput) {
        if !output.value.is_empty() && !self.flags.hidden {
            self.blocks.push(OutputBlock::Echo(output.value));
        }
        for block in split_stdout(&output.stdout) {
            match block {
                OutputBlock::Graphic(svg) if self.flags.canvas.is_some() => self.graphics.push(svg),
                block => self.blocks.push(block),
            }
        }
        if !output.stderr.is_empty() {
            self.blocks.push(OutputBlock::Stderr(output.stderr));
        }
    }

    /// Reset the session to its baseline, restore the mounted code and
    /// clear the output.
    pub fn reset(&mut self) {
        self.draft = self.mounted.clone();
        self.blocks.clear();
        self.graphics.clear();
        if let Err(e) = self.backend.reset() {
            self.blocks.push(OutputBlock::SessionError(e.to_string()));
        }
    }

    pub fn blocks(&self) -> &[OutputBlock] {
        &self.blocks
    }

    pub fn display(&self) -> Display {
        Display {
            syntax: self.syntax,
            editor: (!self.flags.hidden).then(|| self.draft.clone()),
            editable: self.flags.is_editable(),
            canvas: self.flags.canvas.as_ref().map(|id| Canvas {
                id: id.clone(),
                graphics: self.graphics.clone(),
            }),
            blocks: self.blocks.clone(),
        }
    }
}
