use anyhow::Result;
use clap::Parser;
use reframe_batch::overrides::OverrideSet;
use reframe_batch::preset::{parse_preset_list, PresetStore};
use reframe_batch::{config, executor::ProcessRunner, scan, startup};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reframe")]
#[command(about = "Batch render platform-specific video variants with ffmpeg", long_about = None)]
#[command(version)]
struct Args {
    /// Input video file or folder containing videos
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Comma-separated preset names (e.g. instagram_reel,youtube_1080p)
    #[arg(short, long, value_name = "NAMES")]
    preset: String,

    /// Path to the preset file (JSON, or TOML with a .toml extension)
    #[arg(long, value_name = "FILE", default_value = "presets.json")]
    presets_file: PathBuf,

    /// Output directory, created if missing
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Print encoder commands without running them
    #[arg(long)]
    dry_run: bool,

    /// Optional TOML settings file for runtime options
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Encoder binary
    #[arg(long, value_name = "BIN")]
    ffmpeg: Option<String>,

    /// Number of encoder processes to run at once
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Kill a job's encoder after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write the per-job outcome log as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    overrides: OverrideArgs,
}

/// Applied uniformly to every job. Values are validated per job.
#[derive(clap::Args, Debug)]
struct OverrideArgs {
    #[arg(long)]
    width: Option<String>,
    #[arg(long)]
    height: Option<String>,
    #[arg(long)]
    fps: Option<String>,
    /// cover or contain
    #[arg(long)]
    strategy: Option<String>,
    /// bitrate or crf
    #[arg(long)]
    mode: Option<String>,
    /// e.g. 6000k
    #[arg(long)]
    video_bitrate: Option<String>,
    /// Forces crf mode
    #[arg(long)]
    crf: Option<String>,
    /// Encoder speed/quality tier (e.g. medium)
    #[arg(long, alias = "x264_preset")]
    encoder_preset: Option<String>,
    /// e.g. 128k
    #[arg(long)]
    audio_bitrate: Option<String>,
}

impl From<OverrideArgs> for OverrideSet {
    fn from(args: OverrideArgs) -> Self {
        OverrideSet {
            width: args.width,
            height: args.height,
            fps: args.fps,
            strategy: args.strategy,
            mode: args.mode,
            video_bitrate: args.video_bitrate,
            crf: args.crf,
            encoder_preset: args.encoder_preset,
            audio_bitrate: args.audio_bitrate,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    info!("reframe v{}", env!("CARGO_PKG_VERSION"));

    // Runtime options: settings file first, then command line flags
    let mut options = config::load_options(args.settings.as_deref())?;
    if let Some(outdir) = args.outdir {
        options.output_dir = outdir;
    }
    if let Some(encoder) = args.ffmpeg {
        options.encoder = encoder;
    }
    if let Some(jobs) = args.jobs {
        options.max_concurrent_jobs = jobs;
    }
    if args.timeout.is_some() {
        options.job_timeout_secs = args.timeout;
    }
    options.dry_run |= args.dry_run;
    config::validate_options(&options)?;

    if options.dry_run {
        info!("Dry run: skipping encoder check");
    } else {
        match startup::check_encoder(&options.encoder) {
            Ok(encoder) => match encoder.version {
                Some((major, minor, patch)) => {
                    info!("{} version: {}.{}.{}", encoder.binary, major, minor, patch)
                }
                None => info!("{} found (unversioned build)", encoder.binary),
            },
            Err(e) => {
                error!("{}", e);
                return Err(e.into());
            }
        }
    }

    let store = match PresetStore::load(&args.presets_file) {
        Ok(store) => {
            info!(
                "Loaded {} presets from {}",
                store.len(),
                args.presets_file.display()
            );
            store
        }
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let names = parse_preset_list(&args.preset);
    if names.is_empty() {
        anyhow::bail!("--preset must name at least one preset");
    }
    if let Err(e) = store.ensure_known(&names) {
        error!("{}", e);
        return Err(e.into());
    }

    let inputs = match scan::collect_inputs(&args.input) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!("Found {} input file(s)", inputs.len());

    let overrides = OverrideSet::from(args.overrides);
    if !overrides.is_empty() {
        info!("Applying overrides: {:?}", overrides);
    }

    let runner = Arc::new(ProcessRunner::new(
        options.job_timeout_secs.map(Duration::from_secs),
    ));
    let result =
        reframe_batch::run_batch(&inputs, &names, &store, &overrides, &options, runner).await?;

    if let Some(report) = &args.report {
        result.write_report(report)?;
        info!("Wrote report to {}", report.display());
    }

    let code = result.exit_code();
    if code != 0 {
        error!(
            "{} of {} jobs failed (exit {})",
            result.failed(),
            result.len(),
            code
        );
    }
    std::process::exit(code);
}
