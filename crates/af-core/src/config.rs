//! Configuration sections shared by the engines and the pipeline.
//!
//! The binary deserializes these from TOML; every field defaults sensibly so
//! an empty `[section]` (or no section at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::ladder::{Ladder, RenditionSpec};

/// Default engine timeout: 1 hour.
const DEFAULT_TIMEOUT_SECS: u64 = 3600;

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Optional overrides for external tool locations. `None` means "search
/// `PATH`".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub packager_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Transcode
// ---------------------------------------------------------------------------

/// Encoder profile and job limits for the rendition transcoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Video encoder passed to ffmpeg (`-c:v`).
    pub video_codec: String,
    /// Audio encoder passed to ffmpeg (`-c:a`).
    pub audio_codec: String,
    /// Audio bitrate in kbps (`-b:a`).
    pub audio_bitrate_kbps: u32,
    /// Encoder threads per job; `0` lets ffmpeg decide.
    pub threads: u32,
    /// Per-rendition timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum concurrent transcode jobs; `None` uses the CPU count.
    pub max_parallel_jobs: Option<usize>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate_kbps: 128,
            threads: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_parallel_jobs: None,
        }
    }
}

impl TranscodeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Effective job limit, never below one.
    pub fn parallel_jobs(&self) -> usize {
        self.max_parallel_jobs.unwrap_or_else(num_cpus::get).max(1)
    }
}

// ---------------------------------------------------------------------------
// Packaging
// ---------------------------------------------------------------------------

/// Settings passed through to the packager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
    /// Packager timeout in seconds.
    pub timeout_secs: u64,
    /// Target segment duration; `None` keeps the packager default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_duration_secs: Option<u32>,
    /// Hex PSSH box used when keys are supplied without an explicit PSSH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pssh: Option<String>,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            segment_duration_secs: None,
            pssh: None,
        }
    }
}

impl PackagingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Audio track
// ---------------------------------------------------------------------------

/// HLS rendition-group metadata for the single audio stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioTrackConfig {
    pub group_id: String,
    pub name: String,
}

impl Default for AudioTrackConfig {
    fn default() -> Self {
        Self {
            group_id: "audio".to_string(),
            name: "ENGLISH".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ladder entries
// ---------------------------------------------------------------------------

/// One `[[ladder]]` table as written in config.
///
/// Numeric fields are signed so that non-positive values reach validation
/// and produce a ladder error rather than a parse error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenditionConfig {
    pub name: String,
    pub width: i64,
    pub height: i64,
    pub bitrate_kbps: i64,
}

impl From<&RenditionSpec> for RenditionConfig {
    fn from(spec: &RenditionSpec) -> Self {
        Self {
            name: spec.name().to_string(),
            width: spec.width().into(),
            height: spec.height().into(),
            bitrate_kbps: spec.bitrate_kbps().into(),
        }
    }
}

/// Build a ladder from config entries, or `None` when the list is empty.
pub fn ladder_from_config(entries: &[RenditionConfig]) -> Result<Option<Ladder>> {
    if entries.is_empty() {
        return Ok(None);
    }
    Ladder::from_params(
        entries
            .iter()
            .map(|e| (e.name.clone(), [e.width, e.height, e.bitrate_kbps])),
    )
    .map(Some)
}
