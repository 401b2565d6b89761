//! LiveML tree-walking evaluator.
//!
//! Executes canonical (ML syntax) programs directly from the AST. A
//! [`Session`] keeps the bindings of every snippet run since the last
//! reset on top of a prelude that defines the list library and the
//! picture helpers. Every top-level unit runs under a step budget, a call
//! depth limit, an optional timeout and a [`CancelToken`].

mod display;
mod env;
mod error;
mod evaluator;
mod graphics;
mod limits;
mod natives;
mod ops;
mod pattern;
mod printf;
mod session;
mod value;

pub use display::{display_value, float_text};
pub use env::{Env, Namespace};
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use graphics::{image_of_value, value_of_image};
pub use limits::{CancelToken, Limits};
pub use natives::{Arity, Native};
pub use session::{Session, SessionConfig, SessionError, UnitOutput, PRELUDE};
pub use value::{Constructor, List, Value, Variant};
