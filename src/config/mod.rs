mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use af_core::config::ladder_from_config;
use af_core::{EncryptionSpec, Ladder, Pssh, RawKeys};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;
    expand_paths(&mut config);

    tracing::debug!("Loaded config from {:?}", path);
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./abrforge.toml",
        "~/.config/abrforge/config.toml",
        "/etc/abrforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.transcode.timeout_secs == 0 {
        anyhow::bail!("transcode.timeout_secs must be greater than 0");
    }
    if config.packaging.timeout_secs == 0 {
        anyhow::bail!("packaging.timeout_secs must be greater than 0");
    }
    if config.packaging.segment_duration_secs == Some(0) {
        anyhow::bail!("packaging.segment_duration_secs must be greater than 0");
    }

    ladder_from_config(&config.ladder).context("Invalid [[ladder]] section")?;

    if let Some(pssh) = &config.packaging.pssh {
        Pssh::from_hex(pssh).context("Invalid packaging.pssh")?;
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
        ("packager", &config.tools.packager_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    Ok(())
}

fn expand_paths(config: &mut Config) {
    let tools = &mut config.tools;
    for path in [
        &mut tools.ffmpeg_path,
        &mut tools.ffprobe_path,
        &mut tools.packager_path,
        &mut config.output_base,
    ]
    .into_iter()
    .flatten()
    {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        *path = expanded.into();
    }
}

impl Config {
    /// The configured ladder, or the built-in default when none is set.
    pub fn effective_ladder(&self) -> Result<Ladder> {
        Ok(ladder_from_config(&self.ladder)?.unwrap_or_default())
    }

    /// Build encryption parameters from CLI values, falling back to
    /// `packaging.pssh` when no PSSH is given.
    ///
    /// Returns `None` when no keys are supplied. A PSSH without keys is
    /// ignored.
    pub fn encryption(&self, keys: Option<&str>, pssh: Option<&str>) -> Result<Option<EncryptionSpec>> {
        let Some(keys) = keys else {
            if pssh.is_some() {
                tracing::warn!("--pssh given without --keys; output will not be encrypted");
            }
            return Ok(None);
        };

        let keys: RawKeys = keys.parse().context("Invalid --keys")?;
        let pssh = pssh
            .or(self.packaging.pssh.as_deref())
            .context("--keys requires a PSSH box (--pssh or packaging.pssh in config)")?;
        let pssh: Pssh = pssh.parse().context("Invalid PSSH")?;

        Ok(Some(EncryptionSpec::new(keys, pssh)))
    }
}
