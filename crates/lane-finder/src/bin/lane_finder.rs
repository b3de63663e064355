//! `lane-finder` CLI: detect lanes in a directory of frames and write
//! annotated frames plus a JSON report.

use std::path::PathBuf;

use clap::Parser;
use lane_finder::detect::Marking;
use lane_finder::image_io::{ImageDirSink, ImageDirSource};
use lane_finder::{run, LaneFinderConfig, NullSink, RunOptions, RunSummary};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(name = "lane-finder")]
#[command(about = "Find lane lines and centreline waypoints in road video frames")]
#[command(version)]
struct Cli {
    /// JSON config (perspective points, finder parameters, blend weights).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Yellow marking thresholds (JSON), overriding the config.
    #[arg(long)]
    yellow: Option<PathBuf>,

    /// White marking thresholds (JSON), overriding the config.
    #[arg(long)]
    white: Option<PathBuf>,

    /// Directory of input frames, processed in file-name order.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Directory for annotated frames. Nothing is written when omitted.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Path of the JSON run report.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Report lane statuses and waypoint counts only, not the waypoints.
    #[arg(long)]
    no_waypoints: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Print total processing time and FPS.
    #[arg(short, long)]
    benchmark: bool,

    /// Emit logs as JSON lines (requires the `tracing` feature).
    #[arg(long)]
    json_logs: bool,
}

fn init_logging(cli: &Cli) {
    let level = lane_finder::core::log_level(cli.quiet);
    #[cfg(feature = "tracing")]
    lane_finder::core::init_tracing(cli.json_logs, level);
    #[cfg(not(feature = "tracing"))]
    {
        let _ = lane_finder::core::init_with_level(level);
        if cli.json_logs {
            log::warn!("--json-logs needs the `tracing` feature; using plain logs");
        }
    }
}

fn load_config(cli: &Cli) -> CliResult<LaneFinderConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            log::info!("loading config {}", path.display());
            LaneFinderConfig::load_json(path)?
        }
        None => LaneFinderConfig::default(),
    };
    if let Some(path) = &cli.yellow {
        cfg.load_thresholds(Marking::Yellow, path)?;
    }
    if let Some(path) = &cli.white {
        cfg.load_thresholds(Marking::White, path)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run_frames(cli: &Cli, cfg: &LaneFinderConfig) -> CliResult<RunSummary> {
    let frames_dir = cli
        .frames
        .clone()
        .or_else(|| cfg.frames_dir.as_ref().map(PathBuf::from))
        .ok_or("no frame directory: pass --frames or set frames_dir in the config")?;
    let output_dir = cli
        .output
        .clone()
        .or_else(|| cfg.output_dir.as_ref().map(PathBuf::from));

    let finder = cfg.build_finder()?;
    let warp = cfg.build_warp()?;
    let mut source = ImageDirSource::open(&frames_dir)?;
    let options = RunOptions {
        blend: cfg.blend,
        progress: cli.benchmark && !cli.quiet,
        keep_waypoints: !cli.no_waypoints,
        ..RunOptions::default()
    };

    let summary = match output_dir {
        Some(dir) => {
            let mut sink = ImageDirSink::create(&dir)?;
            run(&finder, &warp, &mut source, &mut sink, &options)?
        }
        None => run(&finder, &warp, &mut source, &mut NullSink, &options)?,
    };
    Ok(summary)
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let cfg = load_config(&cli)?;
    let summary = run_frames(&cli, &cfg)?;

    if cli.benchmark {
        println!(
            "Total time (seconds): {:.3}\tFPS: {:.2}",
            summary.processing.as_secs_f64(),
            summary.fps().unwrap_or(f64::INFINITY)
        );
    }

    let report_path = cli.report.clone().unwrap_or_else(|| cfg.report_path());
    let config_path = cli.config.as_ref().map(|p| p.display().to_string());
    summary.into_report(config_path).write_json(&report_path)?;
    log::info!("report written to {}", report_path.display());
    Ok(())
}
