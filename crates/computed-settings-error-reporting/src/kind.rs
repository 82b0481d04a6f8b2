//! The closed set of problem categories reported to users.

use crate::builder::DiagnosticMessageBuilder;
use crate::catalog::lookup;
use crate::diagnostic::DiagnosticKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem categories with stable error codes.
///
/// The title of a diagnostic is always the fixed message of its kind, so the
/// messages can be searched and matched by tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    CannotReadFile,
    FileIsNotUtf8,
    CannotParseFile,
    InvalidFileUri,
    EvaluationFailed,
    ImportCycle,
    NonObjectImport,
    UnsupportedFileType,
    NoClosingComment,
    CannotWriteFile,
    InvalidDestination,
    ImportsMismatch,
    InvalidSetting,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 13] = [
        ErrorKind::CannotReadFile,
        ErrorKind::FileIsNotUtf8,
        ErrorKind::CannotParseFile,
        ErrorKind::InvalidFileUri,
        ErrorKind::EvaluationFailed,
        ErrorKind::ImportCycle,
        ErrorKind::NonObjectImport,
        ErrorKind::UnsupportedFileType,
        ErrorKind::NoClosingComment,
        ErrorKind::CannotWriteFile,
        ErrorKind::InvalidDestination,
        ErrorKind::ImportsMismatch,
        ErrorKind::InvalidSetting,
    ];

    /// Stable error code.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::CannotReadFile => "CS-1-1",
            ErrorKind::FileIsNotUtf8 => "CS-1-2",
            ErrorKind::CannotParseFile => "CS-1-3",
            ErrorKind::InvalidFileUri => "CS-1-4",
            ErrorKind::EvaluationFailed => "CS-1-5",
            ErrorKind::ImportCycle => "CS-2-1",
            ErrorKind::NonObjectImport => "CS-2-2",
            ErrorKind::UnsupportedFileType => "CS-2-3",
            ErrorKind::NoClosingComment => "CS-3-1",
            ErrorKind::CannotWriteFile => "CS-3-2",
            ErrorKind::InvalidDestination => "CS-3-3",
            ErrorKind::ImportsMismatch => "CS-4-1",
            ErrorKind::InvalidSetting => "CS-4-2",
        }
    }

    /// Fixed user-facing message.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::CannotReadFile => "cannot read file",
            ErrorKind::FileIsNotUtf8 => "file contains invalid utf-8 characters",
            ErrorKind::CannotParseFile => "cannot parse file",
            ErrorKind::InvalidFileUri => "invalid file uri",
            ErrorKind::EvaluationFailed => "cannot evaluate file",
            ErrorKind::ImportCycle => "import cycle",
            ErrorKind::NonObjectImport => "imported value is not an object",
            ErrorKind::UnsupportedFileType => "unsupported file type",
            ErrorKind::NoClosingComment => "no closing comment for generated config region",
            ErrorKind::CannotWriteFile => "cannot write to file",
            ErrorKind::InvalidDestination => "invalid destination",
            ErrorKind::ImportsMismatch => "host-reported config and parsed config do not match",
            ErrorKind::InvalidSetting => "invalid setting",
        }
    }

    /// Severity the kind is reported with.
    pub fn severity(self) -> DiagnosticKind {
        match self {
            ErrorKind::ImportsMismatch => DiagnosticKind::Warning,
            _ => DiagnosticKind::Error,
        }
    }

    /// Reverse lookup from an error code.
    pub fn from_code(code: &str) -> Option<ErrorKind> {
        ErrorKind::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Start a diagnostic of this kind.
    ///
    /// # Example
    ///
    /// ```
    /// use computed_settings_error_reporting::ErrorKind;
    ///
    /// let diagnostic = ErrorKind::CannotReadFile
    ///     .diagnostic()
    ///     .add_detail("`a.json` does not exist")
    ///     .build();
    /// assert_eq!(diagnostic.code.as_deref(), Some("CS-1-1"));
    /// assert_eq!(diagnostic.title, "cannot read file");
    /// ```
    pub fn diagnostic(self) -> DiagnosticMessageBuilder {
        let builder = match self.severity() {
            DiagnosticKind::Warning => DiagnosticMessageBuilder::warning(self.message()),
            _ => DiagnosticMessageBuilder::error(self.message()),
        };
        builder.with_code(self.code())
    }

    /// Catalog explanation for this kind.
    pub fn explanation(self) -> Option<&'static str> {
        lookup(self.code()).map(|entry| entry.explanation.as_str())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
