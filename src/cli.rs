use clap::{Parser, Subcommand};
use std::path::PathBuf;

use af_core::RenditionSpec;

#[derive(Parser)]
#[command(name = "abrforge")]
#[command(author, version, about = "Adaptive-bitrate HLS/DASH packaging with optional raw-key DRM")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcode a video into the resolution ladder and package it as HLS + DASH
    Export {
        /// Source video file
        #[arg(required = true)]
        input: PathBuf,

        /// Directory that receives the run's output tree
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Raw keys, comma-separated `label=NAME:key_id=HEX:key=HEX` entries
        #[arg(long)]
        keys: Option<String>,

        /// PSSH box as hex (falls back to packaging.pssh in config)
        #[arg(long, requires = "keys")]
        pssh: Option<String>,

        /// Override the ladder with NAME=WIDTHxHEIGHT@KBPS (repeatable)
        #[arg(short, long = "rendition", value_name = "SPEC")]
        renditions: Vec<RenditionSpec>,

        /// Maximum concurrent transcode jobs
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Print the effective resolution ladder
    Ladder {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}
