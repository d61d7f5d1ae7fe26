//! Progress reporting for dataset loading.
//!
//! Loaders report through [`ProgressCallback`] so they stay independent of
//! how (or whether) progress is rendered. The CLI plugs in an `indicatif`
//! spinner; tests and library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a long-running load.
///
/// Must be `Send + Sync` so a single instance can be shared behind an
/// [`Arc`].
pub trait ProgressCallback: Send + Sync {
    /// Advance progress by `delta` units (rows, features).
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
