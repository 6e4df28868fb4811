//! The resolution ladder: an ordered, validated table of renditions.
//!
//! A [`Ladder`] is immutable once built. Replacing it means building a new
//! one, which is validated as a whole so a bad entry never leaves a
//! half-applied table behind.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Built-in renditions as `(name, width, height, kbps)`, lowest first.
const DEFAULT_RENDITIONS: &[(&str, u32, u32, u32)] = &[
    ("144p", 256, 144, 250),
    ("240p", 426, 240, 500),
    ("360p", 640, 360, 1000),
    ("480p", 854, 480, 2400),
    ("720p", 1280, 720, 4800),
    ("1080p", 1920, 1080, 8000),
    ("2k", 2560, 1440, 6144),
    ("4k", 3840, 2160, 17408),
];

/// One target rendition: name, frame box, and video bitrate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RenditionSpec {
    name: String,
    width: u32,
    height: u32,
    bitrate_kbps: u32,
}

impl RenditionSpec {
    /// Create a rendition spec, validating every field.
    ///
    /// Names end up in file names and in packager stream descriptors, so
    /// they are limited to ASCII alphanumerics, `-`, `_` and `.`.
    pub fn new(name: impl Into<String>, width: u32, height: u32, bitrate_kbps: u32) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        for (field, value) in [("width", width), ("height", height), ("bitrate", bitrate_kbps)] {
            if value == 0 {
                return Err(Error::InvalidLadder(format!(
                    "rendition '{name}': {field} must be greater than 0"
                )));
            }
        }

        Ok(Self {
            name,
            width,
            height,
            bitrate_kbps,
        })
    }

    /// Build a spec from untyped `[width, height, kbps]` parameters.
    pub fn from_params(name: impl Into<String>, params: &[i64]) -> Result<Self> {
        let name = name.into();
        let [width, height, kbps] = params else {
            return Err(Error::InvalidLadder(format!(
                "rendition '{name}': expected 3 parameters (width, height, bitrate), got {}",
                params.len()
            )));
        };

        let to_u32 = |field: &str, v: i64| -> Result<u32> {
            if v <= 0 {
                return Err(Error::InvalidLadder(format!(
                    "rendition '{name}': {field} must be greater than 0, got {v}"
                )));
            }
            u32::try_from(v).map_err(|_| {
                Error::InvalidLadder(format!("rendition '{name}': {field} {v} is out of range"))
            })
        };

        let width = to_u32("width", *width)?;
        let height = to_u32("height", *height)?;
        let kbps = to_u32("bitrate", *kbps)?;
        Self::new(name, width, height, kbps)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }
}

impl fmt::Display for RenditionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}x{}@{}",
            self.name, self.width, self.height, self.bitrate_kbps
        )
    }
}

/// Parses the compact `NAME=WIDTHxHEIGHT@KBPS` form, e.g. `720p=1280x720@4800`.
impl FromStr for RenditionSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            Error::InvalidLadder(format!(
                "'{s}' is not of the form NAME=WIDTHxHEIGHT@KBPS"
            ))
        };

        let (name, rest) = s.split_once('=').ok_or_else(malformed)?;
        let (size, kbps) = rest.split_once('@').ok_or_else(malformed)?;
        let (width, height) = size.split_once(['x', 'X']).ok_or_else(malformed)?;

        let parse = |v: &str| v.trim().parse::<i64>().map_err(|_| malformed());
        let params = [parse(width)?, parse(height)?, parse(kbps)?];
        Self::from_params(name.trim(), &params)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidLadder("rendition name must not be empty".into()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(Error::InvalidLadder(format!(
            "rendition name '{name}' contains invalid character {c:?}"
        )));
    }
    Ok(())
}

/// An ordered set of renditions to produce from one source.
///
/// Order is significant: the packager sees video streams in ladder order.
/// [`Ladder::audio_source_index`] names the rendition whose audio track
/// becomes the run's single audio stream. It defaults to `0`, so the first
/// entry should conventionally be the cheapest rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ladder {
    renditions: Vec<RenditionSpec>,
    audio_source_index: usize,
}

impl Ladder {
    /// Build a ladder from typed specs. Rejects empty tables and duplicate
    /// names.
    pub fn new(renditions: Vec<RenditionSpec>) -> Result<Self> {
        if renditions.is_empty() {
            return Err(Error::InvalidLadder(
                "ladder must contain at least one rendition".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(renditions.len());
        for spec in &renditions {
            if !seen.insert(spec.name()) {
                return Err(Error::InvalidLadder(format!(
                    "duplicate rendition name '{}'",
                    spec.name()
                )));
            }
        }

        Ok(Self {
            renditions,
            audio_source_index: 0,
        })
    }

    /// Build a ladder from `(name, [width, height, kbps])` entries.
    ///
    /// Fails on the first malformed entry.
    pub fn from_params<I, S, P>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: AsRef<[i64]>,
    {
        let renditions = entries
            .into_iter()
            .map(|(name, params)| RenditionSpec::from_params(name, params.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(renditions)
    }

    /// Select which rendition the audio stream is taken from.
    pub fn with_audio_source(mut self, index: usize) -> Result<Self> {
        if index >= self.renditions.len() {
            return Err(Error::InvalidLadder(format!(
                "audio source index {index} out of range for {} renditions",
                self.renditions.len()
            )));
        }
        self.audio_source_index = index;
        Ok(self)
    }

    /// Position of the rendition that supplies the audio stream.
    pub fn audio_source_index(&self) -> usize {
        self.audio_source_index
    }

    /// The rendition that supplies the audio stream.
    pub fn audio_source(&self) -> &RenditionSpec {
        &self.renditions[self.audio_source_index]
    }

    pub fn renditions(&self) -> &[RenditionSpec] {
        &self.renditions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenditionSpec> {
        self.renditions.iter()
    }

    pub fn len(&self) -> usize {
        self.renditions.len()
    }

    /// Whether the ladder has no renditions.
    pub fn is_empty(&self) -> bool {
        self.renditions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RenditionSpec> {
        self.renditions.iter().find(|r| r.name() == name)
    }
}

impl Default for Ladder {
    fn default() -> Self {
        let renditions = DEFAULT_RENDITIONS
            .iter()
            .map(|&(name, width, height, bitrate_kbps)| RenditionSpec {
                name: name.to_string(),
                width,
                height,
                bitrate_kbps,
            })
            .collect();
        Self {
            renditions,
            audio_source_index: 0,
        }
    }
}

impl<'a> IntoIterator for &'a Ladder {
    type Item = &'a RenditionSpec;
    type IntoIter = std::slice::Iter<'a, RenditionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
