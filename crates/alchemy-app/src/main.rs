use alchemy_app::{DemoScript, load_config, run};
use alchemy_core::AlchemyEngine;
use alchemy_render::AssetCatalog;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const MAX_FRAME_MILLIS: u64 = 60_000;

#[derive(Parser, Debug)]
#[command(
    name = "alchemy",
    version,
    about = "Run the alchemy table engine against a scripted marker feed"
)]
struct Cli {
    /// Number of frames to simulate; defaults to the length of the demo script.
    #[arg(long)]
    frames: Option<usize>,
    /// JSON file overriding engine configuration values.
    #[arg(long, env = "ALCHEMY_CONFIG")]
    config: Option<PathBuf>,
    /// Directory holding the `images/` artwork folder.
    #[arg(long, default_value = ".")]
    assets: PathBuf,
    /// Logical milliseconds between frames (1 to 60000).
    #[arg(
        long,
        default_value_t = 33,
        value_parser = clap::value_parser!(u64).range(1..=MAX_FRAME_MILLIS)
    )]
    frame_millis: u64,
    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let mut engine = AlchemyEngine::new(config).context("failed to build engine")?;
    let assets = AssetCatalog::discover(&cli.assets);
    let missing = assets.missing();
    if !missing.is_empty() {
        warn!(?missing, assets = %cli.assets.display(), "artwork missing; those icons are skipped");
    }

    let script = DemoScript::for_engine(&engine)?;
    let frames = cli.frames.unwrap_or(script.len());
    info!(frames, frame_millis = cli.frame_millis, "Starting alchemy table run");
    let summary = run(
        &mut engine,
        &script,
        frames,
        Duration::from_millis(cli.frame_millis),
        &assets,
        Instant::now(),
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
