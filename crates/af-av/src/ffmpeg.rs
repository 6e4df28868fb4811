//! Rendition encoding via the ffmpeg CLI.

use std::path::PathBuf;

use async_trait::async_trait;

use af_core::config::TranscodeConfig;

use crate::command::ToolCommand;
use crate::engine::{ResizeMode, TranscodeEngine, TranscodeRequest};
use crate::tools::ToolRegistry;

/// [`TranscodeEngine`] backed by `ffmpeg`.
///
/// Each request becomes one ffmpeg process: scale-to-fit into the target
/// box, then a bitrate-constrained encode with the configured codecs.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    config: TranscodeConfig,
}

impl FfmpegTranscoder {
    pub fn new(program: PathBuf, config: TranscodeConfig) -> Self {
        Self { program, config }
    }

    /// Build from a discovered `ffmpeg`.
    pub fn from_registry(tools: &ToolRegistry, config: TranscodeConfig) -> af_core::Result<Self> {
        let ffmpeg = tools.require("ffmpeg")?;
        Ok(Self::new(ffmpeg.path.clone(), config))
    }

    pub(crate) fn command(&self, request: &TranscodeRequest) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.timeout(self.config.timeout());
        cmd.args(["-y", "-hide_banner", "-nostdin"]);
        if self.config.threads > 0 {
            cmd.args(["-threads".to_string(), self.config.threads.to_string()]);
        }
        cmd.arg("-i");
        cmd.arg(request.input.to_string_lossy().as_ref());

        cmd.args(["-vf".to_string(), scale_filter(request)]);
        cmd.args(["-c:v", &self.config.video_codec]);
        cmd.args(["-b:v".to_string(), format!("{}k", request.bitrate_kbps)]);
        cmd.args(["-c:a", &self.config.audio_codec]);
        cmd.args(["-b:a".to_string(), format!("{}k", self.config.audio_bitrate_kbps)]);
        cmd.args(["-movflags", "+faststart"]);

        cmd.arg(request.output.to_string_lossy().as_ref());
        cmd
    }
}

/// Video filter for the requested resize mode.
///
/// `force_divisible_by=2` keeps the fitted size legal for 4:2:0 encoders.
fn scale_filter(request: &TranscodeRequest) -> String {
    match request.resize_mode {
        ResizeMode::Fit => format!(
            "scale=w={}:h={}:force_original_aspect_ratio=decrease:force_divisible_by=2",
            request.width, request.height
        ),
    }
}

#[async_trait]
impl TranscodeEngine for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn transcode(&self, request: &TranscodeRequest) -> af_core::Result<()> {
        tracing::info!(
            rendition = %request.rendition,
            "encode {}x{} @ {}k -> {:?}",
            request.width,
            request.height,
            request.bitrate_kbps,
            request.output
        );
        self.command(request).execute().await?;
        Ok(())
    }
}
