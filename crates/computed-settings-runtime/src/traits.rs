//! The `SystemRuntime` trait and its error type.

use async_trait::async_trait;
use computed_settings_source_map::Uri;
use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The file does not exist
    #[error("file not found: {0}")]
    NotFound(Uri),

    /// The file exists but may not be read or written
    #[error("permission denied: {0}")]
    PermissionDenied(Uri),

    /// The runtime cannot address this location (e.g. a non-`file` scheme)
    #[error("operation not supported for {0}")]
    NotSupported(Uri),

    /// Any other I/O error
    #[error("I/O error on {uri}: {source}")]
    Io {
        uri: Uri,
        #[source]
        source: io::Error,
    },
}

impl RuntimeError {
    /// Classify an `io::Error` raised while accessing `uri`.
    pub fn from_io(uri: &Uri, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => RuntimeError::NotFound(uri.clone()),
            io::ErrorKind::PermissionDenied => RuntimeError::PermissionDenied(uri.clone()),
            _ => RuntimeError::Io {
                uri: uri.clone(),
                source: error,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }
}

/// Byte-level file access by URI.
///
/// Everything above this trait works with [`Uri`]s and never touches the
/// file system directly, so tests can swap in [`crate::MemoryRuntime`].
/// Decoding is left to callers: invalid UTF-8 is a separate diagnostic from
/// a failed read.
#[async_trait]
pub trait SystemRuntime: Send + Sync {
    /// Read entire file contents as bytes.
    async fn file_read(&self, uri: &Uri) -> RuntimeResult<Vec<u8>>;

    /// Write bytes to a file, creating it (and missing parent directories)
    /// or replacing its contents.
    async fn file_write(&self, uri: &Uri, contents: &[u8]) -> RuntimeResult<()>;

    /// Whether a file exists at `uri`.
    async fn file_exists(&self, uri: &Uri) -> RuntimeResult<bool>;
}

/// A runtime shared between tasks.
pub type SharedRuntime = Arc<dyn SystemRuntime>;
