//! The capabilities an evaluation needs from its caller.

use crate::error::EvalResult;
use async_trait::async_trait;
use computed_settings_config::ConfigValue;
use computed_settings_error_reporting::{DiagnosticMessage, ErrorKind};
use computed_settings_source_map::{SourceInfo, Uri};

/// Why a read requested by the evaluator did not produce text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFailure {
    /// Stop evaluating right away; not a diagnostic.
    Cancelled,
    /// The file could not be read or decoded.
    Failed { kind: ErrorKind, message: String },
}

/// File access handed to the evaluator.
///
/// The evaluator never touches the file system itself. Every import goes
/// through [`ImportHost::resolve`], which also lets the host record the
/// import for navigation, and every file is read with [`ImportHost::read`].
#[async_trait]
pub trait ImportHost: Send + Sync {
    /// Resolve `reference`, written at `location` in the importing file.
    ///
    /// Returns the message to report when the reference cannot be
    /// followed (for instance a non-`file` scheme).
    fn resolve(&self, reference: &str, location: &SourceInfo) -> Result<Uri, String>;

    /// Read a resolved import as UTF-8 text.
    async fn read(&self, uri: &Uri) -> Result<String, ReadFailure>;

    /// Report a problem that does not stop the evaluation by itself.
    fn report(&self, diagnostic: DiagnosticMessage);
}

/// Turns the text of a configuration program into a value.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        uri: &Uri,
        text: &str,
        host: &dyn ImportHost,
    ) -> EvalResult<ConfigValue>;
}
