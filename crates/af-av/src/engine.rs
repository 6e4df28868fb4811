//! Contracts for the two external engines the pipeline drives.
//!
//! Each engine call is a single opaque request: the pipeline never sees
//! command lines, only typed requests and a success/failure result. The
//! concrete adapters live in [`crate::ffmpeg`] and [`crate::shaka`]; tests
//! supply fakes.

use std::path::PathBuf;

use async_trait::async_trait;

use af_core::{EncryptionSpec, StreamDescriptor};

/// How the source frame is fitted into the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Scale to fit inside the box, preserving aspect ratio. No crop, no pad.
    #[default]
    Fit,
}

/// One rendition encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    /// Rendition name, for logging and error context.
    pub rendition: String,
    pub input: PathBuf,
    pub width: u32,
    pub height: u32,
    pub resize_mode: ResizeMode,
    pub bitrate_kbps: u32,
    pub output: PathBuf,
}

/// One packaging invocation covering every stream of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingRequest {
    /// Streams in packager order: audio first, then video in ladder order.
    pub descriptors: Vec<StreamDescriptor>,
    pub hls_output: PathBuf,
    pub dash_output: PathBuf,
    pub encryption: Option<EncryptionSpec>,
    pub segment_duration_secs: Option<u32>,
}

/// Produces one encoded file per request.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    /// Short name for logs (e.g. "ffmpeg").
    fn name(&self) -> &'static str;

    /// Encode `request.input` into `request.output`.
    ///
    /// Implementations must bound their own run time and report a timeout as
    /// an error instead of hanging.
    async fn transcode(&self, request: &TranscodeRequest) -> af_core::Result<()>;
}

/// Produces manifests and segments from a descriptor list.
#[async_trait]
pub trait PackagingEngine: Send + Sync {
    /// Short name for logs (e.g. "packager").
    fn name(&self) -> &'static str;

    async fn package(&self, request: &PackagingRequest) -> af_core::Result<()>;
}
