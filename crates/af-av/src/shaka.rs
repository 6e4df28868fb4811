//! HLS + DASH packaging and raw-key encryption via Shaka `packager`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use af_core::config::PackagingConfig;
use af_core::StreamDescriptor;

use crate::command::ToolCommand;
use crate::engine::{PackagingEngine, PackagingRequest};
use crate::tools::ToolRegistry;

/// [`PackagingEngine`] backed by Shaka `packager`.
#[derive(Debug, Clone)]
pub struct ShakaPackager {
    program: PathBuf,
    config: PackagingConfig,
}

impl ShakaPackager {
    pub fn new(program: PathBuf, config: PackagingConfig) -> Self {
        Self { program, config }
    }

    /// Build from a discovered `packager`.
    pub fn from_registry(tools: &ToolRegistry, config: PackagingConfig) -> af_core::Result<Self> {
        let packager = tools.require("packager")?;
        Ok(Self::new(packager.path.clone(), config))
    }

    pub(crate) fn command(&self, request: &PackagingRequest) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.timeout(self.config.timeout());

        for descriptor in &request.descriptors {
            cmd.arg(stream_argument(descriptor));
        }

        cmd.arg("--hls_master_playlist_output");
        cmd.arg(path_str(&request.hls_output));
        cmd.arg("--mpd_output");
        cmd.arg(path_str(&request.dash_output));

        if let Some(secs) = request.segment_duration_secs {
            cmd.args(["--segment_duration".to_string(), secs.to_string()]);
        }

        if let Some(encryption) = &request.encryption {
            cmd.arg("--enable_raw_key_encryption");
            cmd.args(["--keys".to_string(), encryption.keys().to_string()]);
            cmd.args(["--pssh".to_string(), encryption.pssh().to_hex()]);
        }

        cmd
    }
}

/// Render one descriptor as a packager stream argument
/// (`in=...,stream=...,output=...`).
fn stream_argument(descriptor: &StreamDescriptor) -> String {
    let mut fields = vec![
        format!("in={}", path_str(descriptor.source())),
        format!("stream={}", descriptor.selector()),
        format!("output={}", path_str(descriptor.output())),
        format!("playlist_name={}", descriptor.playlist_name()),
    ];

    match descriptor {
        StreamDescriptor::Audio { group_id, label, .. } => {
            fields.push(format!("hls_group_id={group_id}"));
            fields.push(format!("hls_name={label}"));
        }
        StreamDescriptor::Video {
            iframe_playlist_name,
            ..
        } => {
            fields.push(format!("iframe_playlist_name={iframe_playlist_name}"));
        }
    }

    fields.join(",")
}

/// Stream arguments are comma-separated, so a `,` in any path would split a
/// field.
fn check_stream_paths(descriptors: &[StreamDescriptor]) -> af_core::Result<()> {
    for path in descriptors.iter().flat_map(|d| [d.source(), d.output()]) {
        if path.to_string_lossy().contains(',') {
            return Err(af_core::Error::tool(
                "packager",
                format!("stream path {} contains ','", path.display()),
            ));
        }
    }
    Ok(())
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

#[async_trait]
impl PackagingEngine for ShakaPackager {
    fn name(&self) -> &'static str {
        "packager"
    }

    async fn package(&self, request: &PackagingRequest) -> af_core::Result<()> {
        tracing::info!(
            streams = request.descriptors.len(),
            encrypted = request.encryption.is_some(),
            "package -> {:?}, {:?}",
            request.hls_output,
            request.dash_output
        );
        check_stream_paths(&request.descriptors)?;
        self.command(request).execute().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::drm::TEST_CONTENT_PSSH;
    use af_core::EncryptionSpec;

    const KEYS: &str =
        "label=:key_id=abba271e8bcf552bbd2e86a434a9a5d9:key=69eaa802a6763af979e8d1940fb88392";

    fn request(encryption: Option<EncryptionSpec>) -> PackagingRequest {
        PackagingRequest {
            descriptors: vec![
                StreamDescriptor::Audio {
                    source: "/run/resolutions/video_144p.mp4".into(),
                    output: "/run/output/audio.mp4".into(),
                    playlist_name: "audio.m3u8".into(),
                    group_id: "audio".into(),
                    label: "ENGLISH".into(),
                },
                StreamDescriptor::Video {
                    source: "/run/resolutions/video_144p.mp4".into(),
                    output: "/run/output/h264_144p.mp4".into(),
                    playlist_name: "h264_144p.m3u8".into(),
                    iframe_playlist_name: "h264_144p_iframe.m3u8".into(),
                },
            ],
            hls_output: "/run/output/h264_master.m3u8".into(),
            dash_output: "/run/output/h264.mpd".into(),
            encryption,
            segment_duration_secs: None,
        }
    }

    fn packager() -> ShakaPackager {
        ShakaPackager::new("packager".into(), PackagingConfig::default())
    }

    #[test]
    fn stream_arguments_in_descriptor_order() {
        let cmd = packager().command(&request(None));
        let args = cmd.get_args();

        assert_eq!(
            args[0],
            "in=/run/resolutions/video_144p.mp4,stream=audio,output=/run/output/audio.mp4,\
             playlist_name=audio.m3u8,hls_group_id=audio,hls_name=ENGLISH"
        );
        assert_eq!(
            args[1],
            "in=/run/resolutions/video_144p.mp4,stream=video,output=/run/output/h264_144p.mp4,\
             playlist_name=h264_144p.m3u8,iframe_playlist_name=h264_144p_iframe.m3u8"
        );
        assert_eq!(
            &args[2..],
            [
                "--hls_master_playlist_output",
                "/run/output/h264_master.m3u8",
                "--mpd_output",
                "/run/output/h264.mpd",
            ]
        );
    }

    #[test]
    fn no_encryption_flags_without_keys() {
        let cmd = packager().command(&request(None));
        let args = cmd.get_args();
        for flag in ["--enable_raw_key_encryption", "--keys", "--pssh"] {
            assert!(!args.iter().any(|a| a == flag), "unexpected {flag}");
        }
    }

    #[test]
    fn encryption_flags_carry_keys_and_pssh() {
        let spec = EncryptionSpec::parse(KEYS, TEST_CONTENT_PSSH).unwrap();
        let cmd = packager().command(&request(Some(spec)));
        let args = cmd.get_args();

        let at = |flag: &str| args.iter().position(|a| a == flag);
        assert!(at("--enable_raw_key_encryption").is_some());
        assert_eq!(args[at("--keys").unwrap() + 1], KEYS);
        assert_eq!(args[at("--pssh").unwrap() + 1], TEST_CONTENT_PSSH);
    }

    #[test]
    fn segment_duration_passed_through() {
        let mut req = request(None);
        req.segment_duration_secs = Some(6);
        let cmd = packager().command(&req);
        let args = cmd.get_args();
        let i = args.iter().position(|a| a == "--segment_duration").unwrap();
        assert_eq!(args[i + 1], "6");
    }

    #[test]
    fn each_stream_argument_has_one_field_per_key() {
        let cmd = packager().command(&request(None));
        let args = cmd.get_args();
        assert_eq!(args[0].split(',').count(), 6);
        assert_eq!(args[1].split(',').count(), 5);
    }

    #[tokio::test]
    async fn comma_in_stream_path_fails_before_running() {
        let mut req = request(None);
        if let StreamDescriptor::Video { source, .. } = &mut req.descriptors[1] {
            *source = "/run/intro, part 1/resolutions/video_144p.mp4".into();
        }
        // The program does not exist; the check must fire before spawning.
        let engine = ShakaPackager::new("nonexistent_packager_xyz".into(), PackagingConfig::default());

        let err = engine.package(&req).await.unwrap_err().to_string();
        assert!(err.contains("contains ','"), "unexpected error: {err}");
    }

    #[test]
    fn from_registry_requires_packager() {
        let err = ShakaPackager::from_registry(&ToolRegistry::default(), PackagingConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("packager not found"));
    }
}
