//! Transform error types.

use liveml_types::{Diagnostics, ErrorCode, LiveError, Span, Syntax};
use thiserror::Error;

/// Errors produced while converting between surface syntaxes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The input did not parse in its declared syntax.
    #[error("{0}")]
    Syntax(Diagnostics),

    /// The input parsed, but the printed result did not survive a
    /// re-parse in the target syntax.
    #[error("cannot convert to {target}: {message}")]
    Conversion { target: Syntax, message: String },
}

impl TransformError {
    pub(crate) fn conversion(target: Syntax, message: impl Into<String>) -> Self {
        Self::Conversion {
            target,
            message: message.into(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }

    /// Structured errors for display. A conversion failure has no source
    /// position and is reported at the start of the snippet.
    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            Self::Syntax(errors) => errors.clone(),
            Self::Conversion { target, message } => {
                let mut errors = Diagnostics::empty();
                errors.push_error(LiveError::new(
                    format!("snippet.{}", target.extension()),
                    ErrorCode::CONVERSION_FAILED,
                    message.clone(),
                    Span::point(1, 1),
                    "",
                ));
                errors
            }
        }
    }
}

/// Transform result type alias.
pub type TransformResult<T> = Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;
    use liveml_types::ErrorCategory;

    #[test]
    fn test_conversion_error_diagnostics() {
        let err = TransformError::conversion(Syntax::Reason, "unstable output");
        assert!(!err.is_syntax());
        assert_eq!(err.to_string(), "cannot convert to reason: unstable output");
        let diagnostics = err.diagnostics();
        let first = diagnostics.first().unwrap();
        assert_eq!(first.code, ErrorCode::CONVERSION_FAILED);
        assert_eq!(first.category, ErrorCategory::Transform);
        assert_eq!(first.file, "snippet.re");
    }
}
