//! Output layout for one pipeline run.
//!
//! Every run gets its own root directory, `{base}/{run_id}_{input_name}/`,
//! with two lazily created subtrees:
//!
//! - `resolutions/` -- one raw encode per ladder entry
//! - `output/` -- packaged streams and the HLS/DASH manifests
//!
//! The run id is 128 bits from the OS random source, so concurrent runs on
//! the same base path and input never share a root.

use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use af_core::{Error, Result};

/// Maximum length, in characters, of the input-derived part of the root name.
const MAX_INPUT_NAME_CHARS: usize = 70;

const RESOLUTIONS_DIR: &str = "resolutions";
const OUTPUT_DIR: &str = "output";
const HLS_MASTER_NAME: &str = "h264_master.m3u8";
const DASH_MANIFEST_NAME: &str = "h264.mpd";

/// The directory tree of a single run.
///
/// # Example
///
/// ```no_run
/// use af_av::layout::prepare_output_tree;
/// use std::path::Path;
///
/// let tree = prepare_output_tree(Path::new("/videos/My Clip.mp4"), None)?;
/// let resolutions = tree.resolutions_dir()?;
/// println!("{}", tree.rendition_path("720p").display());
/// # Ok::<(), af_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
    run_id: String,
}

/// Create the unique root directory for a run.
///
/// `base` defaults to the system temp directory.
///
/// # Errors
///
/// - [`Error::InputNotFound`] if `input` is not an existing file. Nothing is
///   created in that case.
/// - [`Error::DirectoryCreation`] if the root cannot be created, or if
///   `base` contains a `,`. Packager stream arguments are comma-separated,
///   so such a root could never be packaged.
pub fn prepare_output_tree(input: &Path, base: Option<&Path>) -> Result<OutputTree> {
    if !input.is_file() {
        return Err(Error::input_not_found(input));
    }

    let base = base.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    if base.to_string_lossy().contains(',') {
        return Err(Error::DirectoryCreation {
            path: base,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "output base must not contain ','",
            ),
        });
    }
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let run_id = random_run_id();
    let root = base.join(format!("{run_id}_{}", sanitize_input_name(&file_name)));

    ensure_dir(&root)?;
    tracing::info!(root = %root.display(), "prepared output tree");

    Ok(OutputTree { root, run_id })
}

impl OutputTree {
    /// Root directory of this run.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Random identifier embedded in the root name.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// `resolutions/`, created if missing.
    pub fn resolutions_dir(&self) -> Result<PathBuf> {
        self.subdir(RESOLUTIONS_DIR)
    }

    /// `output/`, created if missing.
    pub fn output_dir(&self) -> Result<PathBuf> {
        self.subdir(OUTPUT_DIR)
    }

    /// Path of the raw encode for a rendition. Does not touch the disk.
    pub fn rendition_path(&self, rendition: &str) -> PathBuf {
        self.root
            .join(RESOLUTIONS_DIR)
            .join(format!("video_{rendition}.mp4"))
    }

    /// Path of a file inside `output/`. Does not touch the disk.
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.root.join(OUTPUT_DIR).join(name)
    }

    pub fn hls_manifest_path(&self) -> PathBuf {
        self.output_file(HLS_MASTER_NAME)
    }

    pub fn dash_manifest_path(&self) -> PathBuf {
        self.output_file(DASH_MANIFEST_NAME)
    }

    fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        ensure_dir(&dir)?;
        Ok(dir)
    }
}

/// Create `path` (and parents) unless it already exists.
///
/// Idempotent, and a concurrent creator winning the race is not an error:
/// failure is reported only if the directory is still missing afterwards.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o775);
    }

    match builder.create(path) {
        Ok(()) => Ok(()),
        Err(_) if path.is_dir() => Ok(()),
        Err(source) => Err(Error::DirectoryCreation {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Derive the filesystem-friendly part of the root name from a file name.
///
/// Whitespace and `,` become `_`, everything from the first `.` after the leading
/// character is dropped (`my.clip.mp4` -> `my`), and the result is capped
/// at 70 characters.
pub fn sanitize_input_name(file_name: &str) -> String {
    let stem = match file_name.char_indices().skip(1).find(|&(_, c)| c == '.') {
        Some((idx, _)) => &file_name[..idx],
        None => file_name,
    };

    stem.chars()
        .map(|c| if c.is_whitespace() || c == ',' { '_' } else { c })
        .take(MAX_INPUT_NAME_CHARS)
        .collect()
}

/// 128 bits from the OS random source, in hyphenated UUID layout.
///
/// No version or variant bits are set; the layout is cosmetic.
fn random_run_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    Uuid::from_bytes(bytes).hyphenated().to_string()
}
