//! Observer trait for pipeline stage events.
//!
//! Inject an `Arc<dyn PipelineObserver>` via
//! [`crate::config::EnhanceConfigBuilder::observer`] to receive stage
//! transitions as the session works through a run. The callback approach is
//! the least-invasive integration point: hosts can forward events to a
//! progress bar, a websocket, or a log without the library knowing how the
//! host renders them.
//!
//! All methods have default no-op implementations so callers only override
//! what they care about.

use crate::session::ProcessingStatus;
use std::sync::Arc;

/// Called by the session as a run moves through its stages.
///
/// Implementations must be `Send + Sync`; the session itself drives stages
/// strictly sequentially, so no two callbacks for the same run overlap.
pub trait PipelineObserver: Send + Sync {
    /// Called once when a run begins, before validation.
    fn on_run_start(&self) {}

    /// Called on every forward status transition.
    ///
    /// `status.progress_percent()` gives a coarse completion figure for
    /// progress bars.
    fn on_stage(&self, status: ProcessingStatus) {
        let _ = status;
    }

    /// Called when the run reaches `Complete`.
    ///
    /// `summary_len` is the byte length of the produced summary.
    fn on_run_complete(&self, summary_len: usize) {
        let _ = summary_len;
    }

    /// Called when the run fails; `message` is what the session stores.
    fn on_run_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for hosts that don't need progress events.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::EnhanceConfig`].
pub type Observer = Arc<dyn PipelineObserver>;
