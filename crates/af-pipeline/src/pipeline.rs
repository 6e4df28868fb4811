//! The export pipeline: output tree, transcode fan-out, descriptor planning
//! and packaging, run strictly in that order.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use af_av::{
    prepare_output_tree, FfmpegTranscoder, PackagingEngine, ShakaPackager, ToolRegistry,
    TranscodeEngine,
};
use af_core::config::{AudioTrackConfig, PackagingConfig, TranscodeConfig};
use af_core::{EncryptionSpec, Ladder, PackagedOutput, Result};

use crate::context::{ProgressSender, RunContext};
use crate::descriptors::build_descriptors;
use crate::packaging::PackagingCoordinator;
use crate::transcoder::RenditionTranscoder;

/// Converts one source video into encrypted or clear HLS + DASH output.
///
/// A `Pipeline` holds the ladder and engines and can run any number of
/// exports; each export gets its own unique output tree.
///
/// ```no_run
/// # async fn run() -> af_core::Result<()> {
/// use af_av::ToolRegistry;
/// use af_core::config::{PackagingConfig, TranscodeConfig, ToolsConfig};
/// use af_pipeline::Pipeline;
/// use std::path::Path;
///
/// let tools = ToolRegistry::discover(&ToolsConfig::default());
/// let mut pipeline = Pipeline::from_tools(
///     &tools,
///     &TranscodeConfig::default(),
///     &PackagingConfig::default(),
/// )?;
/// pipeline.set_ladder([("360p", [640, 360, 800]), ("720p", [1280, 720, 4800])])?;
///
/// let out = pipeline.export(Path::new("/videos/clip.mp4"), None, None).await?;
/// println!("{}", out.hls.display());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    ladder: Ladder,
    transcoder: RenditionTranscoder,
    packager: PackagingCoordinator,
    audio: AudioTrackConfig,
    ctx: RunContext,
}

impl Pipeline {
    /// A pipeline over the default ladder, with one transcode job per CPU.
    pub fn new(transcode: Arc<dyn TranscodeEngine>, package: Arc<dyn PackagingEngine>) -> Self {
        let jobs = TranscodeConfig::default().parallel_jobs();
        Self {
            ladder: Ladder::default(),
            transcoder: RenditionTranscoder::new(transcode, jobs),
            packager: PackagingCoordinator::new(package),
            audio: AudioTrackConfig::default(),
            ctx: RunContext::default(),
        }
    }

    /// Build the ffmpeg + Shaka packager pipeline from discovered tools.
    ///
    /// Fails with a tool error if either binary is missing.
    pub fn from_tools(
        tools: &ToolRegistry,
        transcode: &TranscodeConfig,
        packaging: &PackagingConfig,
    ) -> Result<Self> {
        let ffmpeg = FfmpegTranscoder::from_registry(tools, transcode.clone())?;
        let packager = ShakaPackager::from_registry(tools, packaging.clone())?;

        Ok(Self::new(Arc::new(ffmpeg), Arc::new(packager))
            .with_max_parallel_jobs(transcode.parallel_jobs())
            .with_segment_duration(packaging.segment_duration_secs))
    }

    pub fn with_ladder(mut self, ladder: Ladder) -> Self {
        self.ladder = ladder;
        self
    }

    /// Replace the ladder from `(name, [width, height, kbps])` entries.
    ///
    /// On error the current ladder is left untouched.
    pub fn set_ladder<I, S, P>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: AsRef<[i64]>,
    {
        self.ladder = Ladder::from_params(entries)?;
        tracing::debug!(renditions = self.ladder.len(), "ladder replaced");
        Ok(self)
    }

    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    pub fn with_max_parallel_jobs(mut self, jobs: usize) -> Self {
        self.transcoder = self.transcoder.with_max_parallel_jobs(jobs);
        self
    }

    pub fn with_audio_track(mut self, audio: AudioTrackConfig) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_segment_duration(mut self, secs: Option<u32>) -> Self {
        self.packager = self.packager.with_segment_duration(secs);
        self
    }

    /// Use `token` to cancel exports from outside.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.ctx.cancellation = token;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.ctx.progress = Arc::new(progress);
        self
    }

    /// Token that cancels exports of this pipeline.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancellation.clone()
    }

    /// Run one export of `input`.
    ///
    /// The run root is created under `output_base` (the system temp directory
    /// when `None`). Packaging only starts after every rendition transcoded
    /// successfully; encryption is applied when `encryption` is `Some`.
    ///
    /// # Errors
    ///
    /// - [`af_core::Error::InputNotFound`] before anything is created on disk.
    /// - [`af_core::Error::Transcode`] naming the first rendition that failed.
    ///   The packager is not invoked.
    /// - [`af_core::Error::Packaging`] if the packager fails.
    /// - [`af_core::Error::Cancelled`] if the cancellation token fires.
    pub async fn export(
        &self,
        input: &Path,
        output_base: Option<&Path>,
        encryption: Option<EncryptionSpec>,
    ) -> Result<PackagedOutput> {
        tracing::info!(
            input = %input.display(),
            renditions = self.ladder.len(),
            encrypted = encryption.is_some(),
            "starting export"
        );
        self.ctx.check_cancelled()?;

        let tree = prepare_output_tree(input, output_base)?;
        let renditions = self
            .transcoder
            .transcode_all(input, &self.ladder, &tree, &self.ctx)
            .await?;

        self.ctx.check_cancelled()?;
        let descriptors = build_descriptors(&renditions, &tree, &self.audio)?;
        let output = self.packager.package(descriptors, &tree, encryption).await?;

        self.ctx.progress.send(100.0, "packaged");
        tracing::info!(
            run_id = tree.run_id(),
            hls = %output.hls.display(),
            dash = %output.dash.display(),
            "export complete"
        );
        Ok(output)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("ladder", &self.ladder)
            .field("transcoder", &self.transcoder.engine_name())
            .field("max_parallel_jobs", &self.transcoder.max_parallel_jobs())
            .field("packager", &self.packager.engine_name())
            .finish_non_exhaustive()
    }
}
