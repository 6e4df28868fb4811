use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use af_core::config::{
    AudioTrackConfig, PackagingConfig, RenditionConfig, ToolsConfig, TranscodeConfig,
};

/// Top-level `abrforge.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub packaging: PackagingConfig,

    #[serde(default)]
    pub audio: AudioTrackConfig,

    /// Directory that receives per-run output trees (default: system temp dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_base: Option<PathBuf>,

    /// Resolution ladder; empty means the built-in default
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ladder: Vec<RenditionConfig>,
}
