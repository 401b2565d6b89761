use thiserror::Error;

/// Errors raised when an image violates a structural contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphicsError {
    /// A non-empty path must begin by placing the pen.
    #[error("path must start with MoveTo, found {found}")]
    PathStart { found: &'static str },

    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: f64 },
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;
