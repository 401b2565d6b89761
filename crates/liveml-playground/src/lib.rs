//! LiveML playground controller.
//!
//! Binds a code block to an evaluation session:
//!
//! ```text
//! draft ─→ liveml-transform (to ML) ─→ Evaluate backend ─→ [UnitOutput] ─→ Display
//! ```
//!
//! A backend is a plain [`liveml_eval::Session`], a session shared through
//! `Rc<RefCell<_>>`, or a [`SessionHandle`] that keeps the session on a
//! worker thread.

mod backend;
mod config;
mod error;
mod flags;
mod output;
mod playground;
mod worker;

pub use backend::Evaluate;
pub use config::PlaygroundConfig;
pub use error::PlaygroundError;
pub use flags::{Flags, DEFAULT_CANVAS};
pub use output::{split_stdout, Canvas, Display, OutputBlock};
pub use playground::Playground;
pub use worker::SessionHandle;
