mod cli;

use abrforge::config;

use af_av::ToolRegistry;
use af_core::{Ladder, RenditionSpec};
use af_pipeline::{Pipeline, ProgressSender};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

/// Tools `export` cannot run without.
const REQUIRED_TOOLS: &[&str] = &["ffmpeg", "packager"];

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "abrforge=trace,af_pipeline=trace,af_av=trace,af_core=trace".to_string()
        } else {
            "abrforge=debug,af_pipeline=debug,af_av=debug,af_core=debug".to_string()
        }
    });

    // Logs go to stderr so `export` output on stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export {
            input,
            output,
            keys,
            pssh,
            renditions,
            jobs,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(export(ExportArgs {
                input,
                output,
                keys,
                pssh,
                renditions,
                jobs,
                config_path: cli.config,
            }))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Ladder { json } => print_ladder(cli.config.as_deref(), json),
        Commands::Version => {
            println!("abrforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Pipeline errors carry their own exit code; everything else is a usage or
/// config problem.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<af_core::Error>())
        .map(af_core::Error::exit_code)
        .unwrap_or(1)
}

struct ExportArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    keys: Option<String>,
    pssh: Option<String>,
    renditions: Vec<RenditionSpec>,
    jobs: Option<usize>,
    config_path: Option<PathBuf>,
}

async fn export(args: ExportArgs) -> Result<()> {
    let config = config::load_config_or_default(args.config_path.as_deref())?;

    // Fail on caller mistakes before touching tools or the filesystem.
    if !args.input.is_file() {
        return Err(af_core::Error::input_not_found(&args.input).into());
    }
    let encryption = config.encryption(args.keys.as_deref(), args.pssh.as_deref())?;
    let ladder = if args.renditions.is_empty() {
        config.effective_ladder()?
    } else {
        Ladder::new(args.renditions)?
    };

    let tools = ToolRegistry::discover(&config.tools);
    for name in REQUIRED_TOOLS {
        tools.require(name)?;
    }

    let mut transcode = config.transcode.clone();
    if let Some(jobs) = args.jobs {
        transcode.max_parallel_jobs = Some(jobs);
    }

    let pipeline = Pipeline::from_tools(&tools, &transcode, &config.packaging)?
        .with_ladder(ladder)
        .with_audio_track(config.audio.clone())
        .with_progress(ProgressSender::new(|pct, step| {
            tracing::info!("[{:.0}%] {}", pct, step);
        }));

    let token = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling export");
            token.cancel();
        }
    });

    let output_base = args.output.or(config.output_base);
    tracing::info!("Exporting {:?}", args.input);
    let output = pipeline
        .export(&args.input, output_base.as_deref(), encryption)
        .await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let required = REQUIRED_TOOLS.contains(&tool.name.as_str());
        let status = if tool.available {
            "✓"
        } else if required {
            all_ok = false;
            "✗"
        } else {
            "-"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some required tools are missing: export needs ffmpeg and Shaka packager.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            let ladder = config.effective_ladder()?;
            println!("✓ Configuration is valid");
            println!("  Renditions: {}", ladder.len());
            println!("  Video codec: {}", config.transcode.video_codec);
            println!("  Parallel jobs: {}", config.transcode.parallel_jobs());
            println!(
                "  PSSH configured: {}",
                if config.packaging.pssh.is_some() { "yes" } else { "no" }
            );
            if let Some(base) = &config.output_base {
                println!("  Output base: {}", base.display());
            }
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Renditions: {}", Ladder::default().len());
            println!("  Video codec: {}", config.transcode.video_codec);
        }
    }

    Ok(())
}

fn print_ladder(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ladder = config.effective_ladder()?;

    if json {
        let json_str =
            serde_json::to_string_pretty(&ladder).context("Failed to serialize ladder")?;
        println!("{}", json_str);
        return Ok(());
    }

    for (i, spec) in ladder.iter().enumerate() {
        let marker = if i == ladder.audio_source_index() {
            " [audio]"
        } else {
            ""
        };
        println!("{}{}", spec, marker);
    }

    Ok(())
}
