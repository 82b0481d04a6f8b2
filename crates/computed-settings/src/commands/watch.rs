//! Watch command - re-apply whenever a relevant file changes
//!
//! The directories of every settings file, destination and imported file
//! of the last pass are watched. A change to one of those files invalidates
//! the service, cancels a pass still in flight and starts a new one.

use super::WorkspaceArgs;
use super::apply::print_report;
use anyhow::{Context, Result};
use computed_settings_core::{Cancellation, PassError, SettingsService};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, Debouncer, new_debouncer};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// File-system watcher over the directories of the watched files.
struct FileWatcher {
    debouncer: Debouncer<notify::RecommendedWatcher>,
    event_rx: mpsc::UnboundedReceiver<Vec<PathBuf>>,
    directories: HashSet<PathBuf>,
    files: HashSet<PathBuf>,
}

impl FileWatcher {
    fn new(debounce: Duration) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let debouncer = new_debouncer(
            debounce,
            move |res: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match res {
                Ok(events) => {
                    let paths = events.into_iter().map(|event| event.path).collect();
                    if event_tx.send(paths).is_err() {
                        debug!("Event receiver dropped, stopping watcher");
                    }
                }
                Err(e) => warn!(error = %e, "Filesystem watch error"),
            },
        )
        .context("Failed to create filesystem watcher")?;

        Ok(FileWatcher {
            debouncer,
            event_rx,
            directories: HashSet::new(),
            files: HashSet::new(),
        })
    }

    /// Watch `files` from now on. Files that do not exist yet are noticed
    /// when they are created, since their directory is watched.
    fn watch(&mut self, files: impl IntoIterator<Item = PathBuf>) {
        for file in files {
            if let Some(directory) = existing_ancestor(&file)
                && !self.directories.contains(&directory)
            {
                match self
                    .debouncer
                    .watcher()
                    .watch(&directory, RecursiveMode::NonRecursive)
                {
                    Ok(()) => {
                        debug!(path = %directory.display(), "watching directory");
                        self.directories.insert(directory);
                    }
                    Err(e) => warn!(path = %directory.display(), error = %e, "Cannot watch directory"),
                }
            }
            self.files.insert(file.canonicalize().unwrap_or(file));
        }
    }

    /// Wait for a change to one of the watched files.
    async fn changed(&mut self) -> Option<PathBuf> {
        loop {
            let paths = self.event_rx.recv().await?;
            if let Some(path) = paths.into_iter().find(|path| self.is_relevant(path)) {
                return Some(path);
            }
        }
    }

    fn is_relevant(&self, path: &Path) -> bool {
        self.files.contains(path) || path.canonicalize().is_ok_and(|path| self.files.contains(&path))
    }
}

/// The nearest existing directory containing `file`.
fn existing_ancestor(file: &Path) -> Option<PathBuf> {
    file.ancestors().skip(1).find(|dir| dir.is_dir()).map(Path::to_path_buf)
}

pub async fn execute(args: &WorkspaceArgs, debounce_ms: u64) -> Result<()> {
    let service = args.service(false)?;
    let mut watcher = FileWatcher::new(Duration::from_millis(debounce_ms))?;
    info!(debounce_ms, "Watching for changes (Ctrl-C to stop)");

    loop {
        let cancel = Cancellation::new();
        let pass = service.run_pass(&cancel);
        tokio::pin!(pass);

        let result = tokio::select! {
            result = &mut pass => result,
            changed = watcher.changed() => {
                let Some(path) = changed else { return Ok(()) };
                info!(path = %path.display(), "Change during pass, restarting");
                cancel.cancel();
                let _ = (&mut pass).await;
                service.invalidate().await;
                continue;
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };

        match result {
            Ok(report) => {
                print_report(&report, false)?;
                watcher.watch(
                    report
                        .watched_files()
                        .iter()
                        .filter_map(|uri| uri.to_file_path()),
                );
            }
            Err(PassError::Cancelled(_)) => debug!("pass cancelled"),
        }

        if !wait_for_change(&service, &mut watcher).await {
            return Ok(());
        }
    }
}

/// Wait for the next relevant change and invalidate the service. `false`
/// when watching should stop.
async fn wait_for_change(service: &SettingsService, watcher: &mut FileWatcher) -> bool {
    tokio::select! {
        changed = watcher.changed() => match changed {
            Some(path) => {
                info!(path = %path.display(), "File changed");
                service.invalidate().await;
                true
            }
            None => false,
        },
        _ = tokio::signal::ctrl_c() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_ancestor() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("a/b/settings.json");
        assert_eq!(existing_ancestor(&missing), Some(temp.path().to_path_buf()));
    }

    #[tokio::test]
    async fn test_only_watched_files_are_relevant() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let mut watcher = FileWatcher::new(Duration::from_millis(50)).unwrap();
        watcher.watch([root.join("settings.json")]);

        assert!(watcher.is_relevant(&root.join("settings.json")));
        assert!(!watcher.is_relevant(&root.join("other.json")));
    }
}
