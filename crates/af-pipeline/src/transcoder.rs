//! Bounded fan-out of one transcode job per ladder entry.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use af_av::{OutputTree, ResizeMode, TranscodeEngine, TranscodeRequest};
use af_core::{Error, Ladder, RenditionArtifact, Renditions, Result};

use crate::context::RunContext;

/// Runs a ladder through a [`TranscodeEngine`], at most `max_parallel_jobs`
/// encodes at a time.
///
/// Jobs are launched in ladder order. The first failure cancels the run: no
/// further jobs start, in-flight jobs are dropped (which kills their child
/// processes) and the fan-out returns [`Error::Transcode`] for the rendition
/// that failed.
pub struct RenditionTranscoder {
    engine: Arc<dyn TranscodeEngine>,
    max_parallel_jobs: usize,
}

type JobOutcome = (usize, TranscodeRequest, Result<()>);

impl RenditionTranscoder {
    pub fn new(engine: Arc<dyn TranscodeEngine>, max_parallel_jobs: usize) -> Self {
        Self {
            engine,
            max_parallel_jobs: max_parallel_jobs.max(1),
        }
    }

    pub fn with_max_parallel_jobs(mut self, max_parallel_jobs: usize) -> Self {
        self.max_parallel_jobs = max_parallel_jobs.max(1);
        self
    }

    pub fn max_parallel_jobs(&self) -> usize {
        self.max_parallel_jobs
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Encode every rendition of `ladder` from `input` into the run's
    /// `resolutions/` directory.
    ///
    /// On success the returned [`Renditions`] lists one artifact per ladder
    /// entry, in ladder order, regardless of completion order.
    pub async fn transcode_all(
        &self,
        input: &Path,
        ladder: &Ladder,
        tree: &OutputTree,
        ctx: &RunContext,
    ) -> Result<Renditions> {
        tree.resolutions_dir()?;

        // Units of work for progress: one per rendition plus packaging.
        let total_units = ladder.len() + 1;
        let run_token = ctx.cancellation.child_token();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel_jobs));
        let mut jobs: JoinSet<JobOutcome> = JoinSet::new();

        tracing::info!(
            engine = self.engine.name(),
            renditions = ladder.len(),
            jobs = self.max_parallel_jobs,
            "transcoding ladder"
        );

        for (index, spec) in ladder.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = run_token.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => permit
                    .map_err(|_| Error::Internal("transcode limiter closed".into()))?,
            };

            let request = TranscodeRequest {
                rendition: spec.name().to_string(),
                input: input.to_path_buf(),
                width: spec.width(),
                height: spec.height(),
                resize_mode: ResizeMode::Fit,
                bitrate_kbps: spec.bitrate_kbps(),
                output: tree.rendition_path(spec.name()),
            };
            let engine = Arc::clone(&self.engine);
            let token = run_token.clone();

            tracing::debug!(rendition = %request.rendition, "launching transcode");
            jobs.spawn(async move {
                let _permit = permit;
                let outcome = run_job(engine.as_ref(), &request, &token).await;
                if outcome.is_err() {
                    token.cancel();
                }
                (index, request, outcome)
            });
        }

        let mut artifacts: Vec<Option<RenditionArtifact>> = vec![None; ladder.len()];
        let mut failure: Option<Error> = None;
        let mut completed = 0;

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((index, request, Ok(()))) => {
                    completed += 1;
                    tracing::info!(
                        rendition = %request.rendition,
                        "[{completed}/{}] transcoded",
                        ladder.len()
                    );
                    ctx.progress.send_units(
                        completed,
                        total_units,
                        &format!("transcoded {}", request.rendition),
                    );
                    artifacts[index] = Some(RenditionArtifact::new(request.rendition, request.output));
                }
                // Siblings stopped by a cancellation; the cause is reported elsewhere.
                Ok((_, _, Err(Error::Cancelled))) => {}
                Ok((_, request, Err(e))) => {
                    if failure.is_none() {
                        tracing::error!(rendition = %request.rendition, "transcode failed: {e}");
                        if !jobs.is_empty() {
                            tracing::warn!(jobs = jobs.len(), "cancelling in-flight transcodes");
                        }
                        failure = Some(Error::transcode(request.rendition, e));
                    }
                }
                Err(join_err) => {
                    run_token.cancel();
                    if failure.is_none() {
                        failure = Some(Error::Internal(format!("transcode task failed: {join_err}")));
                    }
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        if run_token.is_cancelled() {
            tracing::info!(completed, "transcoding cancelled");
            return Err(Error::Cancelled);
        }

        let artifacts = artifacts
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::Internal("transcode finished with missing renditions".into()))?;
        Renditions::new(artifacts, ladder.audio_source_index())
    }
}

async fn run_job(
    engine: &dyn TranscodeEngine,
    request: &TranscodeRequest,
    token: &CancellationToken,
) -> Result<()> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        result = engine.transcode(request) => result,
    }
}
