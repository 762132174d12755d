//! Offline tracking CLI.
//!
//! Runs the calibration-driven pipeline over image files — no camera or
//! pointer device involved — and prints a JSON report of per-frame marker
//! centroids and mapped screen points.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{error, LevelFilter};
use serde::Serialize;

use hue_pointer::core::{hsv_from_rgb, init_with_level};
use hue_pointer::detect::load_rgb_frame;
use hue_pointer::{
    CalibrationSet, CalibrationStore, Centroid, CoordinateMapper, FrameSegmenter,
    JsonCalibrationStore, MapperParams, MarkerLocalizer, MarkerSlot, Resolution, ScreenPoint,
    SegmentParams,
};

#[derive(Parser)]
#[command(name = "hue-pointer", version, about = "Colored-marker tracking over image files")]
struct Cli {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info", value_parser = parse_log_level)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run segment → localize → map over image frames and print a JSON
    /// report.
    Track(TrackArgs),
    /// Print a stored calibration set as JSON.
    Show(ShowArgs),
}

#[derive(Args)]
struct TrackArgs {
    /// Calibration JSON produced by a calibration run.
    #[arg(long)]
    calibration: PathBuf,

    /// Screen resolution to map into, as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080", value_parser = parse_resolution)]
    screen: Resolution,

    /// Exponential-moving-average weight of the new sample, in (0, 1].
    #[arg(long, default_value_t = 0.5)]
    smoothing: f32,

    /// Mirror the mapped x axis.
    #[arg(long)]
    invert_x: bool,

    /// Mirror the mapped y axis.
    #[arg(long)]
    invert_y: bool,

    /// Image frames, processed in order.
    #[arg(required = true)]
    frames: Vec<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Calibration JSON to display.
    #[arg(long)]
    calibration: PathBuf,
}

#[derive(Serialize)]
struct MarkerReport {
    centroid: Centroid,
    screen: Option<ScreenPoint>,
}

#[derive(Serialize)]
struct FrameReport {
    frame: String,
    marker_a: MarkerReport,
    marker_b: MarkerReport,
}

#[derive(Serialize)]
struct TrackReport {
    calibration: CalibrationSet,
    screen: Resolution,
    frames: Vec<FrameReport>,
}

fn parse_log_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse()
        .map_err(|_| format!("invalid log level {raw:?}"))
}

fn parse_resolution(raw: &str) -> Result<Resolution, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width = w.parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height = h.parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok(Resolution::new(width, height))
}

fn load_calibration(path: &PathBuf) -> Result<CalibrationSet, String> {
    JsonCalibrationStore::new(path)
        .load()
        .ok_or_else(|| format!("no usable calibration at {}", path.display()))
}

fn track(args: TrackArgs) -> Result<(), Box<dyn std::error::Error>> {
    let calibration = load_calibration(&args.calibration)?;
    let mapper_params = MapperParams {
        smoothing: args.smoothing,
        invert_x: args.invert_x,
        invert_y: args.invert_y,
        ..MapperParams::default()
    };
    let segmenter = FrameSegmenter::new(SegmentParams::default());
    let localizer = MarkerLocalizer::new();

    let mut last_point: [Option<ScreenPoint>; 2] = [None; 2];
    let mut frames = Vec::with_capacity(args.frames.len());

    for path in &args.frames {
        let frame = load_rgb_frame(path)?;
        let camera = Resolution::new(frame.width as u32, frame.height as u32);
        let mapper = CoordinateMapper::new(mapper_params, camera, args.screen);
        let hsv = hsv_from_rgb(&frame);

        let mut report_for = |slot: MarkerSlot| {
            let idx = slot.index();
            let seg = segmenter.segment(&hsv.view(), calibration.model(slot));
            let centroid = localizer.localize(&seg.regions);
            let mapped = mapper.map(centroid, last_point[idx]);
            if let Some(point) = mapped {
                last_point[idx] = Some(point);
            }
            MarkerReport {
                centroid,
                screen: mapped,
            }
        };

        let marker_a = report_for(MarkerSlot::A);
        let marker_b = report_for(MarkerSlot::B);
        frames.push(FrameReport {
            frame: path.display().to_string(),
            marker_a,
            marker_b,
        });
    }

    let report = TrackReport {
        calibration,
        screen: args.screen,
        frames,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn show(args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let calibration = load_calibration(&args.calibration)?;
    println!("{}", serde_json::to_string_pretty(&calibration)?);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = init_with_level(cli.log_level);

    let result = match cli.command {
        Command::Track(args) => track(args),
        Command::Show(args) => show(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
