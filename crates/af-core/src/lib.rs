//! af-core: shared types, errors, and configuration for the abrforge
//! packaging pipeline.
//!
//! This crate is the foundational dependency for the other af-* crates. It
//! owns the resolution ladder, the stream descriptor model handed to the
//! packager, raw-key DRM parameters, and the per-engine config sections.

pub mod config;
pub mod drm;
pub mod error;
pub mod ladder;
pub mod stream;

pub use drm::{EncryptionSpec, Pssh, RawKey, RawKeys};
pub use error::{Error, Result};
pub use ladder::{Ladder, RenditionSpec};
pub use stream::{PackagedOutput, RenditionArtifact, Renditions, StreamDescriptor};
