//! In-memory runtime for tests.

use crate::traits::{RuntimeError, RuntimeResult, SystemRuntime};
use async_trait::async_trait;
use computed_settings_source_map::Uri;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A file system held in memory.
///
/// Counts reads per file and can delay individual reads, which lets tests
/// control the order in which concurrent loads complete.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<Uri, Vec<u8>>,
    reads: HashMap<Uri, usize>,
    delays: HashMap<Uri, Duration>,
    read_only: HashSet<Uri>,
    writes: Vec<Uri>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep using it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Builder-style [`MemoryRuntime::insert`].
    pub fn with_file(self, uri: Uri, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(uri, contents);
        self
    }

    pub fn insert(&self, uri: Uri, contents: impl Into<Vec<u8>>) {
        self.state().files.insert(uri, contents.into());
    }

    pub fn remove(&self, uri: &Uri) -> Option<Vec<u8>> {
        self.state().files.remove(uri)
    }

    /// Current contents as text, if the file exists and is UTF-8.
    pub fn contents(&self, uri: &Uri) -> Option<String> {
        let state = self.state();
        let bytes = state.files.get(uri)?;
        String::from_utf8(bytes.clone()).ok()
    }

    /// Delay every read of `uri` by `delay`. Needs a tokio runtime.
    pub fn set_delay(&self, uri: Uri, delay: Duration) {
        self.state().delays.insert(uri, delay);
    }

    /// Make writes to `uri` fail with `PermissionDenied`.
    pub fn set_read_only(&self, uri: Uri) {
        self.state().read_only.insert(uri);
    }

    /// How many times `uri` was read.
    pub fn read_count(&self, uri: &Uri) -> usize {
        self.state().reads.get(uri).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.state().reads.values().sum()
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<Uri> {
        self.state().writes.clone()
    }
}

#[async_trait]
impl SystemRuntime for MemoryRuntime {
    async fn file_read(&self, uri: &Uri) -> RuntimeResult<Vec<u8>> {
        let delay = {
            let mut state = self.state();
            *state.reads.entry(uri.clone()).or_default() += 1;
            state.delays.get(uri).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state()
            .files
            .get(uri)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound(uri.clone()))
    }

    async fn file_write(&self, uri: &Uri, contents: &[u8]) -> RuntimeResult<()> {
        let mut state = self.state();
        if state.read_only.contains(uri) {
            return Err(RuntimeError::PermissionDenied(uri.clone()));
        }
        state.files.insert(uri.clone(), contents.to_vec());
        state.writes.push(uri.clone());
        Ok(())
    }

    async fn file_exists(&self, uri: &Uri) -> RuntimeResult<bool> {
        Ok(self.state().files.contains_key(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use computed_settings_source_map::PathConvention;

    fn uri(path: &str) -> Uri {
        Uri::file(path, PathConvention::Posix)
    }

    #[test]
    fn test_reads_are_counted() {
        let rt = MemoryRuntime::new().with_file(uri("/a.json"), "{}");
        pollster::block_on(async {
            assert_eq!(rt.file_read(&uri("/a.json")).await.unwrap(), b"{}");
            assert!(rt.file_read(&uri("/b.json")).await.unwrap_err().is_not_found());
        });
        assert_eq!(rt.read_count(&uri("/a.json")), 1);
        assert_eq!(rt.read_count(&uri("/b.json")), 1);
        assert_eq!(rt.total_reads(), 2);
    }

    #[test]
    fn test_read_only_files_reject_writes() {
        let rt = MemoryRuntime::new().with_file(uri("/s.json"), "{}");
        rt.set_read_only(uri("/s.json"));
        let err = pollster::block_on(rt.file_write(&uri("/s.json"), b"[]")).unwrap_err();
        assert!(matches!(err, RuntimeError::PermissionDenied(_)));
        assert_eq!(rt.contents(&uri("/s.json")).as_deref(), Some("{}"));
        assert!(rt.writes().is_empty());
    }

    #[tokio::test]
    async fn test_delayed_reads_finish_later() {
        let rt = MemoryRuntime::new()
            .with_file(uri("/slow.json"), "1")
            .with_file(uri("/fast.json"), "2");
        rt.set_delay(uri("/slow.json"), Duration::from_millis(30));

        let order = Mutex::new(Vec::new());
        let slow = async {
            rt.file_read(&uri("/slow.json")).await.unwrap();
            order.lock().unwrap().push("slow");
        };
        let fast = async {
            rt.file_read(&uri("/fast.json")).await.unwrap();
            order.lock().unwrap().push("fast");
        };
        tokio::join!(slow, fast);
        assert_eq!(*order.lock().unwrap(), vec!["fast", "slow"]);
    }
}
