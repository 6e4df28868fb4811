//! Artifacts produced by the transcoder and stream descriptors consumed by
//! the packager.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// One encoded rendition on disk, inside `resolutions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenditionArtifact {
    pub rendition: String,
    pub path: PathBuf,
}

impl RenditionArtifact {
    pub fn new(rendition: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            rendition: rendition.into(),
            path: path.into(),
        }
    }
}

/// The complete, ordered artifact set of one run, keyed by rendition name.
///
/// Only built once every transcode job has succeeded, so holders can rely on
/// one artifact per ladder entry in ladder order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renditions {
    artifacts: Vec<RenditionArtifact>,
    audio_source_index: usize,
}

impl Renditions {
    /// Wrap artifacts that are already in ladder order.
    pub fn new(artifacts: Vec<RenditionArtifact>, audio_source_index: usize) -> Result<Self> {
        if audio_source_index >= artifacts.len() {
            return Err(Error::Internal(format!(
                "audio source index {audio_source_index} out of range for {} artifacts",
                artifacts.len()
            )));
        }
        Ok(Self {
            artifacts,
            audio_source_index,
        })
    }

    pub fn get(&self, rendition: &str) -> Option<&RenditionArtifact> {
        self.artifacts.iter().find(|a| a.rendition == rendition)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenditionArtifact> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// The artifact whose audio track becomes the run's audio stream.
    pub fn audio_source(&self) -> &RenditionArtifact {
        &self.artifacts[self.audio_source_index]
    }
}

impl<'a> IntoIterator for &'a Renditions {
    type Item = &'a RenditionArtifact;
    type IntoIter = std::slice::Iter<'a, RenditionArtifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A request to the packager describing one input's role and output names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stream", rename_all = "lowercase")]
pub enum StreamDescriptor {
    /// The audio track extracted from one rendition.
    Audio {
        source: PathBuf,
        output: PathBuf,
        playlist_name: String,
        group_id: String,
        label: String,
    },
    /// The video track of one rendition.
    Video {
        source: PathBuf,
        output: PathBuf,
        playlist_name: String,
        iframe_playlist_name: String,
    },
}

impl StreamDescriptor {
    /// The packager's stream selector for this descriptor.
    pub fn selector(&self) -> &'static str {
        match self {
            StreamDescriptor::Audio { .. } => "audio",
            StreamDescriptor::Video { .. } => "video",
        }
    }

    pub fn source(&self) -> &Path {
        match self {
            StreamDescriptor::Audio { source, .. } | StreamDescriptor::Video { source, .. } => {
                source
            }
        }
    }

    pub fn output(&self) -> &Path {
        match self {
            StreamDescriptor::Audio { output, .. } | StreamDescriptor::Video { output, .. } => {
                output
            }
        }
    }

    pub fn playlist_name(&self) -> &str {
        match self {
            StreamDescriptor::Audio { playlist_name, .. }
            | StreamDescriptor::Video { playlist_name, .. } => playlist_name,
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, StreamDescriptor::Audio { .. })
    }
}

/// Final locations of a packaged run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagedOutput {
    /// The `output/` directory holding streams and manifests.
    pub path: PathBuf,
    /// HLS master playlist.
    pub hls: PathBuf,
    /// DASH manifest.
    pub dash: PathBuf,
}
