//! Packaging stage: one packager invocation producing HLS and DASH output.

use std::sync::Arc;

use af_av::{OutputTree, PackagingEngine, PackagingRequest};
use af_core::{EncryptionSpec, Error, PackagedOutput, Result, StreamDescriptor};

/// Hands the descriptor list to a [`PackagingEngine`] and checks that both
/// manifests were written.
pub struct PackagingCoordinator {
    engine: Arc<dyn PackagingEngine>,
    segment_duration_secs: Option<u32>,
}

impl PackagingCoordinator {
    pub fn new(engine: Arc<dyn PackagingEngine>) -> Self {
        Self {
            engine,
            segment_duration_secs: None,
        }
    }

    pub fn with_segment_duration(mut self, secs: Option<u32>) -> Self {
        self.segment_duration_secs = secs;
        self
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Package `descriptors` into the run's `output/` directory.
    ///
    /// Encryption flags are only emitted when `encryption` is `Some`.
    ///
    /// # Errors
    ///
    /// Any engine failure, or a success that left a manifest missing, is
    /// returned as [`Error::Packaging`].
    pub async fn package(
        &self,
        descriptors: Vec<StreamDescriptor>,
        tree: &OutputTree,
        encryption: Option<EncryptionSpec>,
    ) -> Result<PackagedOutput> {
        let path = tree.output_dir()?;
        let request = PackagingRequest {
            descriptors,
            hls_output: tree.hls_manifest_path(),
            dash_output: tree.dash_manifest_path(),
            encryption,
            segment_duration_secs: self.segment_duration_secs,
        };

        tracing::info!(
            engine = self.engine.name(),
            streams = request.descriptors.len(),
            encrypted = request.encryption.is_some(),
            "packaging"
        );
        self.engine.package(&request).await.map_err(|e| {
            tracing::error!("packaging failed: {e}");
            Error::packaging(e)
        })?;

        for manifest in [&request.hls_output, &request.dash_output] {
            if !manifest.is_file() {
                return Err(Error::packaging(Error::Internal(format!(
                    "{} reported success but {} is missing",
                    self.engine.name(),
                    manifest.display()
                ))));
            }
        }

        Ok(PackagedOutput {
            path,
            hls: request.hls_output,
            dash: request.dash_output,
        })
    }
}
