//! # af-pipeline
//!
//! Orchestrates one export: a unique output tree, a bounded-parallel
//! transcode of every ladder rendition, stream descriptor planning, and a
//! single packaging run producing HLS and DASH manifests.
//!
//! The engines are [`af_av::TranscodeEngine`] and [`af_av::PackagingEngine`]
//! trait objects, so tests and embedders can swap in their own.

pub mod context;
pub mod descriptors;
pub mod packaging;
pub mod pipeline;
pub mod transcoder;

pub use context::{ProgressSender, RunContext};
pub use descriptors::build_descriptors;
pub use packaging::PackagingCoordinator;
pub use pipeline::Pipeline;
pub use transcoder::RenditionTranscoder;
