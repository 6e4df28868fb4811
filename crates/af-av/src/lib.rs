//! # af-av
//!
//! External tool management, output layout and engine adapters for the
//! abrforge pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg,
//!   ffprobe and Shaka packager.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Output layout** ([`layout::prepare_output_tree`]) -- unique per-run
//!   directory trees with lazily created subdirectories.
//! - **Engine contracts** ([`TranscodeEngine`], [`PackagingEngine`]) and their
//!   CLI-backed implementations ([`FfmpegTranscoder`], [`ShakaPackager`]).

pub mod command;
pub mod engine;
pub mod ffmpeg;
pub mod layout;
pub mod shaka;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use engine::{PackagingEngine, PackagingRequest, ResizeMode, TranscodeEngine, TranscodeRequest};
pub use ffmpeg::FfmpegTranscoder;
pub use layout::{ensure_dir, prepare_output_tree, OutputTree};
pub use shaka::ShakaPackager;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
