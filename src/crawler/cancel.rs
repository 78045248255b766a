//! One-way stop latch shared by every task of a crawl run

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Shared stop signal for a crawl run
///
/// Starts active and can be tripped exactly once. Tripping is visible to all
/// tasks through [`is_stopped`](Self::is_stopped) and wakes every fetch
/// waiting on [`CancellationToken::cancelled`].
#[derive(Debug, Default)]
pub struct CancellationController {
    token: CancellationToken,
    tripped: AtomicBool,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the latch to the stopped state
    ///
    /// Returns true only for the call that performed the transition; later
    /// calls are no-ops.
    pub fn trip(&self) -> bool {
        if self.tripped.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!("Stop requested, no new pages will be admitted or fetched");
        self.token.cancel();
        true
    }

    /// Cheap poll usable at any scheduling decision point
    pub fn is_stopped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Signal handed to in-flight fetches
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
