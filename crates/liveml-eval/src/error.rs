//! Runtime faults for the LiveML evaluator.
//!
//! Messages follow the wording of an ML toplevel, since they are shown
//! verbatim in a unit's stderr channel.

use liveml_graphics::GraphicsError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Unbound value {0}")]
    Unbound(String),

    #[error("Unbound constructor {0}")]
    UnboundConstructor(String),

    #[error("Unbound module {0}")]
    UnboundModule(String),

    #[error("The constructor {name} expects {expected} argument(s), but is applied here to {found} argument(s)")]
    ConstructorArity {
        name: String,
        expected: usize,
        found: usize,
    },

    /// An operand of the wrong kind, detected at run time.
    #[error("Type error: {0}")]
    TypeMismatch(String),

    #[error("This expression has type {0}; it is not a function and cannot be applied")]
    NotAFunction(String),

    #[error("This kind of expression is not allowed as right-hand side of `let rec'")]
    InvalidRec,

    #[error("Exception: Match_failure.")]
    MatchFailure,

    #[error("Exception: Division_by_zero.")]
    DivisionByZero,

    #[error("Exception: Invalid_argument \"compare: functional value\".")]
    FunctionalValue,

    /// An exception raised by user code or a library function, already
    /// printed as a constructor: `Failure "boom"`, `Not_found`.
    #[error("Exception: {0}.")]
    Raised(String),

    #[error("Invalid image: {0}")]
    Graphics(#[from] GraphicsError),

    // ── Resource bounds ──
    #[error("Execution stopped: step limit of {0} exceeded")]
    GasExhausted(u64),

    #[error("Stack overflow during evaluation (call depth exceeded {0})")]
    DepthExceeded(usize),

    #[error("Stack overflow during evaluation (data nested deeper than {0} levels)")]
    DataTooDeep(usize),

    #[error("Execution stopped: timed out after {0} ms")]
    Timeout(u64),

    #[error("Execution interrupted")]
    Cancelled,
}

impl EvalError {
    pub(crate) fn failure(message: impl AsRef<str>) -> Self {
        Self::Raised(format!("Failure {:?}", message.as_ref()))
    }

    pub(crate) fn invalid_argument(message: impl AsRef<str>) -> Self {
        Self::Raised(format!("Invalid_argument {:?}", message.as_ref()))
    }

    pub(crate) fn type_mismatch(expected: &str, found: &str) -> Self {
        Self::TypeMismatch(format!("expected {expected}, found {found}"))
    }

    /// True for faults raised by a resource bound rather than by the
    /// program itself.
    pub fn is_resource_limit(&self) -> bool {
        matches!(
            self,
            Self::GasExhausted(_)
                | Self::DepthExceeded(_)
                | Self::DataTooDeep(_)
                | Self::Timeout(_)
                | Self::Cancelled
        )
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
