use anyhow::{Context, Result};
use clap::Parser;
use clipstorm::batch::{print_summary, run_batch, BatchRequest, FfmpegComposer};
use clipstorm::caption::{Transcriber, WhisperClient};
use clipstorm::config::Config;
use clipstorm::media::{MediaAsset, MediaKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "clipstorm")]
#[command(version, about = "Batch short-form video composition")]
#[command(
    long_about = "Compose one video per (hook x voice-over x body) combination: trim voice-over silence, cut the hook to match, overlay the narration, optionally burn in auto-generated captions, and append an optional body clip."
)]
struct Cli {
    /// Hook video clip (repeatable)
    #[arg(long = "hook", required = true)]
    hooks: Vec<PathBuf>,

    /// Voice-over audio track (repeatable)
    #[arg(long = "voice", required = true)]
    voiceovers: Vec<PathBuf>,

    /// Optional body clip appended after the overlay (repeatable)
    #[arg(long = "body")]
    bodies: Vec<PathBuf>,

    /// Prefix for the batch directory and every output file
    #[arg(short, long)]
    prefix: String,

    /// Burn auto-generated captions into each output
    #[arg(long)]
    captions: bool,

    /// Number of concurrent composition jobs
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Directory to create the batch directory in (defaults to cwd)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

fn load_assets(paths: &[PathBuf], kind: MediaKind) -> Result<Vec<MediaAsset>> {
    paths
        .iter()
        .map(|path| {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            let original_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(MediaAsset::probed(kind, path.clone(), &original_name))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate(cli.captions)
        .context("Configuration validation failed")?;

    let hooks = load_assets(&cli.hooks, MediaKind::Hook)?;
    let voiceovers = load_assets(&cli.voiceovers, MediaKind::Voiceover)?;
    let bodies = load_assets(&cli.bodies, MediaKind::Body)?;

    let output_root = cli
        .output_dir
        .or(config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    info!("Prefix:      {}", cli.prefix);
    info!("Hooks:       {}", hooks.len());
    info!("Voice-overs: {}", voiceovers.len());
    info!("Bodies:      {}", bodies.len());
    info!("Captions:    {}", cli.captions);

    let transcriber: Option<Arc<dyn Transcriber>> = if cli.captions {
        let api_key = config
            .openai_api_key
            .clone()
            .context("OPENAI_API_KEY required for captions")?;
        Some(Arc::new(WhisperClient::new(api_key)))
    } else {
        None
    };

    let request = BatchRequest {
        prefix: cli.prefix,
        hooks,
        voiceovers,
        bodies,
        captions: cli.captions,
        concurrency: cli.concurrency.unwrap_or(config.concurrency),
        output_root,
        show_progress: true,
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancelled.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling batch...");
        cancel_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl+C handler")?;

    let composer = Arc::new(FfmpegComposer::new(transcriber));
    let report = run_batch(request, composer, cancelled)
        .await
        .context("Batch composition failed")?;

    print_summary(&report);

    if report.exported.is_empty() && report.failed_count() > 0 {
        anyhow::bail!("No videos exported ({} jobs failed)", report.failed_count());
    }

    Ok(())
}
