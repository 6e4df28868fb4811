//! Recording fake engines shared by the export tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use af_av::{PackagingEngine, PackagingRequest, TranscodeEngine, TranscodeRequest};
use af_core::{Error, Result};

/// Writes a small file per request and remembers every request it saw.
#[derive(Default)]
pub struct FakeTranscoder {
    pub requests: Mutex<Vec<TranscodeRequest>>,
    /// Rendition that fails with a tool error.
    pub fail: Option<String>,
    /// Rendition that hangs until its job is cancelled.
    pub hang: Option<String>,
    /// Rendition that reports an engine timeout.
    pub time_out: Option<String>,
    pub delay: Option<Duration>,
}

impl FakeTranscoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(rendition: &str) -> Arc<Self> {
        Arc::new(Self {
            fail: Some(rendition.to_string()),
            ..Default::default()
        })
    }

    pub fn renditions(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.rendition.clone())
            .collect()
    }
}

#[async_trait]
impl TranscodeEngine for FakeTranscoder {
    fn name(&self) -> &'static str {
        "fake-ffmpeg"
    }

    async fn transcode(&self, request: &TranscodeRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        let name = Some(request.rendition.as_str());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.hang.as_deref() == name {
            std::future::pending::<()>().await;
        }
        if self.time_out.as_deref() == name {
            return Err(Error::tool("ffmpeg", "timed out after 1ms"));
        }
        if self.fail.as_deref() == name {
            return Err(Error::tool("ffmpeg", "exit status 1"));
        }

        std::fs::write(&request.output, request.rendition.as_bytes())?;
        Ok(())
    }
}

/// Writes every descriptor output plus both manifests.
#[derive(Default)]
pub struct FakePackager {
    pub requests: Mutex<Vec<PackagingRequest>>,
    pub fail: bool,
}

impl FakePackager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<PackagingRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PackagingEngine for FakePackager {
    fn name(&self) -> &'static str {
        "fake-packager"
    }

    async fn package(&self, request: &PackagingRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(Error::tool("packager", "exit status 1"));
        }
        for descriptor in &request.descriptors {
            if !descriptor.source().is_file() {
                return Err(Error::tool(
                    "packager",
                    format!("missing input {}", descriptor.source().display()),
                ));
            }
            std::fs::write(descriptor.output(), b"segment")?;
        }
        std::fs::write(&request.hls_output, "#EXTM3U\n")?;
        std::fs::write(&request.dash_output, "<MPD/>")?;
        Ok(())
    }
}

/// Create a source file named `name` inside `dir`.
pub fn source_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"not really a video").unwrap();
    path
}

/// Count files in `dir` whose names satisfy `pred`.
pub fn count_files(dir: &Path, pred: impl Fn(&str) -> bool) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| pred(&e.file_name().to_string_lossy()))
        .count()
}
