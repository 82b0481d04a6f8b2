//! Evaluation errors.

use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_source_map::SourceInfo;
use thiserror::Error;

/// Why an evaluation stopped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A problem in the evaluated program or one of its imports.
    #[error("{message}")]
    Failed {
        kind: ErrorKind,
        message: String,
        location: SourceInfo,
    },
    /// The host asked to stop while an import was being read.
    #[error("evaluation cancelled")]
    Cancelled,
}

impl EvalError {
    pub(crate) fn evaluation(message: impl Into<String>, location: SourceInfo) -> Self {
        EvalError::Failed {
            kind: ErrorKind::EvaluationFailed,
            message: message.into(),
            location,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EvalError::Cancelled)
    }

    /// The diagnostic for a failed evaluation, `None` for cancellation.
    pub fn to_diagnostic(&self) -> Option<DiagnosticMessage> {
        match self {
            EvalError::Failed {
                kind,
                message,
                location,
            } => Some(
                kind.diagnostic()
                    .problem(message.clone())
                    .with_location(location.clone())
                    .build(),
            ),
            EvalError::Cancelled => None,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
