//! Runtime backed by the local file system.

use crate::traits::{RuntimeError, RuntimeResult, SystemRuntime};
use async_trait::async_trait;
use computed_settings_source_map::Uri;
use std::path::PathBuf;
use tracing::debug;

/// Reads and writes `file` URIs with `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        NativeRuntime
    }

    fn path(uri: &Uri) -> RuntimeResult<PathBuf> {
        uri.to_file_path()
            .ok_or_else(|| RuntimeError::NotSupported(uri.clone()))
    }
}

#[async_trait]
impl SystemRuntime for NativeRuntime {
    async fn file_read(&self, uri: &Uri) -> RuntimeResult<Vec<u8>> {
        let path = Self::path(uri)?;
        debug!(uri = %uri, "reading file");
        tokio::fs::read(&path)
            .await
            .map_err(|e| RuntimeError::from_io(uri, e))
    }

    async fn file_write(&self, uri: &Uri, contents: &[u8]) -> RuntimeResult<()> {
        let path = Self::path(uri)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RuntimeError::from_io(uri, e))?;
        }
        debug!(uri = %uri, bytes = contents.len(), "writing file");
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| RuntimeError::from_io(uri, e))
    }

    async fn file_exists(&self, uri: &Uri) -> RuntimeResult<bool> {
        let path = Self::path(uri)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| RuntimeError::from_io(uri, e))
    }
}
