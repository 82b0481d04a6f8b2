/*
 * service.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Cached settings and reports across passes.
 */

//! Long-lived state around resolution passes.
//!
//! The service remembers the scope settings it read and the report of the
//! last pass. Both are dropped together by [`SettingsService::invalidate`],
//! which callers invoke whenever a settings file, the workspace trust or
//! the folder list changes. Nothing else is cached between passes: each
//! pass starts from an empty import graph.

use crate::cancel::Cancellation;
use crate::pass::{PassError, PassReport, ResolutionPass};
use crate::scope::{ScopeSettings, WorkspaceLayout, discover_scopes};
use computed_settings_runtime::SharedRuntime;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

#[derive(Default)]
struct Memo {
    scopes: Option<Arc<Vec<ScopeSettings>>>,
    last_report: Option<Arc<PassReport>>,
}

pub struct SettingsService {
    runtime: SharedRuntime,
    pass: ResolutionPass,
    layout: RwLock<WorkspaceLayout>,
    memo: Mutex<Memo>,
}

impl SettingsService {
    pub fn new(runtime: SharedRuntime, pass: ResolutionPass, layout: WorkspaceLayout) -> Self {
        SettingsService {
            runtime,
            pass,
            layout: RwLock::new(layout),
            memo: Mutex::new(Memo::default()),
        }
    }

    pub async fn layout(&self) -> WorkspaceLayout {
        self.layout.read().await.clone()
    }

    /// Replace the workspace layout (folders added, trust granted, ...).
    pub async fn set_layout(&self, layout: WorkspaceLayout) {
        *self.layout.write().await = layout;
        self.invalidate().await;
    }

    /// Forget everything remembered from earlier passes.
    pub async fn invalidate(&self) {
        let mut memo = self.memo.lock().await;
        if memo.scopes.is_some() || memo.last_report.is_some() {
            debug!("invalidating settings memo");
        }
        *memo = Memo::default();
    }

    /// The scope settings, read once per invalidation.
    pub async fn scopes(&self) -> Arc<Vec<ScopeSettings>> {
        if let Some(scopes) = &self.memo.lock().await.scopes {
            return scopes.clone();
        }

        let layout = self.layout().await;
        let mut scopes = Vec::new();
        for location in discover_scopes(&layout) {
            scopes.push(
                ScopeSettings::read(self.runtime.as_ref(), location, self.pass.options().convention)
                    .await,
            );
        }
        let scopes = Arc::new(scopes);
        self.memo.lock().await.scopes = Some(scopes.clone());
        scopes
    }

    /// The report of the last completed pass, if it is still current.
    pub async fn last_report(&self) -> Option<Arc<PassReport>> {
        self.memo.lock().await.last_report.clone()
    }

    /// Run a pass over the current scopes.
    pub async fn run_pass(&self, cancel: &Cancellation) -> Result<Arc<PassReport>, PassError> {
        let scopes = self.scopes().await;
        let report = Arc::new(self.pass.run(&scopes, cancel).await?);
        info!(
            targets = report.targets.len(),
            written = report.targets.iter().filter(|t| t.written).count(),
            "resolution pass finished"
        );
        self.memo.lock().await.last_report = Some(report.clone());
        Ok(report)
    }
}
