//! Per-run state shared by the transcoder and the packaging stage.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Receives `(percent, step)` progress reports during an export.
///
/// Percentages run from 0.0 to 100.0 over the whole run; packaging counts as
/// one unit of work alongside each rendition.
pub struct ProgressSender {
    callback: Box<dyn Fn(f32, &str) + Send + Sync>,
}

impl ProgressSender {
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A sender that discards every report.
    pub fn noop() -> Self {
        Self::new(|_, _| {})
    }

    pub fn send(&self, progress: f32, step: &str) {
        (self.callback)(progress, step);
    }

    /// Report `done` of `total` units of work.
    pub fn send_units(&self, done: usize, total: usize, step: &str) {
        let pct = if total > 0 {
            (done as f32 / total as f32) * 100.0
        } else {
            100.0
        };
        self.send(pct, step);
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Cancellation and progress plumbing for one export.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Cancelling this token stops in-flight transcodes and skips packaging.
    pub cancellation: CancellationToken,
    pub progress: Arc<ProgressSender>,
}

impl RunContext {
    pub fn new(cancellation: CancellationToken, progress: Arc<ProgressSender>) -> Self {
        Self {
            cancellation,
            progress,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Fail fast with [`af_core::Error::Cancelled`] if the run was cancelled.
    pub fn check_cancelled(&self) -> af_core::Result<()> {
        if self.is_cancelled() {
            tracing::info!("export cancelled");
            return Err(af_core::Error::Cancelled);
        }
        Ok(())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CancellationToken::new(), Arc::new(ProgressSender::noop()))
    }
}
