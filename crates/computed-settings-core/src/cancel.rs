/*
 * cancel.rs
 * Copyright (c) 2026 computed-settings contributors
 *
 * Cancellation token shared by every step of a resolution pass.
 */

//! Cooperative cancellation of a resolution pass.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The pass was abandoned. Not a failure and never a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("resolution pass cancelled")]
pub struct Cancelled;

/// A cancellation signal shared by every load of one pass.
///
/// Cloning shares the signal; [`Cancellation::child`] creates one that is
/// cancelled together with its parent but can also be cancelled alone.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: CancellationToken,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `Err(Cancelled)` once the signal has fired.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn child(&self) -> Cancellation {
        Cancellation {
            token: self.token.child_token(),
        }
    }

    /// Resolves when the signal fires.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
