//! Raw-key encryption parameters handed to the packager.
//!
//! Keys use the packager's raw key format: a comma-separated list of
//! `label=<label>:key_id=<hex>:key=<hex>` entries, where the label is
//! optional and both hex values are 16 bytes. The PSSH is a complete
//! ISO-BMFF `pssh` box, hex encoded.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Length in bytes of a content key and of a key id.
const KEY_LEN: usize = 16;

/// Widevine PSSH box carrying the content id "test content id".
///
/// Only useful for local testing against the public test key server; real
/// deployments derive a PSSH per content and key.
pub const TEST_CONTENT_PSSH: &str = "000000317073736800000000EDEF8BA979D64ACEA3C827DCD51D21ED00000011220F7465737420636F6E74656E74206964";

/// One raw content key.
#[derive(Clone, PartialEq, Eq)]
pub struct RawKey {
    label: Option<String>,
    key_id: [u8; KEY_LEN],
    key: [u8; KEY_LEN],
}

impl RawKey {
    pub fn new(label: Option<String>, key_id: [u8; KEY_LEN], key: [u8; KEY_LEN]) -> Self {
        Self { label, key_id, key }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn key_id(&self) -> &[u8; KEY_LEN] {
        &self.key_id
    }
}

// Key bytes never reach logs.
impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKey")
            .field("label", &self.label)
            .field("key_id", &hex::encode(self.key_id))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "label={label}:")?;
        }
        write!(
            f,
            "key_id={}:key={}",
            hex::encode(self.key_id),
            hex::encode(self.key)
        )
    }
}

impl FromStr for RawKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut label = None;
        let mut key_id = None;
        let mut key = None;

        for part in s.trim().split(':') {
            let (field, value) = part.split_once('=').ok_or_else(|| {
                Error::InvalidEncryption(format!("key field '{part}' is not of the form name=value"))
            })?;
            match field {
                "label" => label = Some(value.to_string()),
                "key_id" => key_id = Some(decode_key_bytes("key_id", value)?),
                "key" => key = Some(decode_key_bytes("key", value)?),
                other => {
                    return Err(Error::InvalidEncryption(format!(
                        "unknown key field '{other}'"
                    )))
                }
            }
        }

        match (key_id, key) {
            (Some(key_id), Some(key)) => Ok(Self { label, key_id, key }),
            _ => Err(Error::InvalidEncryption(
                "each key needs both key_id and key".into(),
            )),
        }
    }
}

fn decode_key_bytes(field: &str, value: &str) -> Result<[u8; KEY_LEN]> {
    let bytes = hex::decode(value)
        .map_err(|e| Error::InvalidEncryption(format!("{field} is not valid hex: {e}")))?;
    <[u8; KEY_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        Error::InvalidEncryption(format!(
            "{field} must be {KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// A non-empty list of raw keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeys(Vec<RawKey>);

impl RawKeys {
    pub fn new(keys: Vec<RawKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::InvalidEncryption("key material must not be empty".into()));
        }
        Ok(Self(keys))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawKey> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders the comma-separated form the packager's `--keys` flag expects.
impl fmt::Display for RawKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl FromStr for RawKeys {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let keys = s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(RawKey::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(keys)
    }
}

/// A complete `pssh` box.
#[derive(Clone, PartialEq, Eq)]
pub struct Pssh(Vec<u8>);

impl Pssh {
    /// Validate raw box bytes: the 32-bit size must match and the box type
    /// must be `pssh`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(Error::InvalidEncryption(format!(
                "pssh box is {} bytes, shorter than a box header",
                bytes.len()
            )));
        }
        let size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if size != bytes.len() {
            return Err(Error::InvalidEncryption(format!(
                "pssh box declares {size} bytes but {} were given",
                bytes.len()
            )));
        }
        if &bytes[4..8] != b"pssh" {
            return Err(Error::InvalidEncryption("box type is not 'pssh'".into()));
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| Error::InvalidEncryption(format!("pssh is not valid hex: {e}")))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Debug for Pssh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pssh").field(&self.to_hex()).finish()
    }
}

impl FromStr for Pssh {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Encryption parameters applied uniformly to every stream of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionSpec {
    keys: RawKeys,
    pssh: Pssh,
}

impl EncryptionSpec {
    pub fn new(keys: RawKeys, pssh: Pssh) -> Self {
        Self { keys, pssh }
    }

    /// Parse both halves from their textual forms.
    pub fn parse(keys: &str, pssh_hex: &str) -> Result<Self> {
        Ok(Self::new(keys.parse()?, Pssh::from_hex(pssh_hex)?))
    }

    pub fn keys(&self) -> &RawKeys {
        &self.keys
    }

    pub fn pssh(&self) -> &Pssh {
        &self.pssh
    }
}
