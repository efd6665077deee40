//! phosphor-view - render a host pixel trace through the phosphor engine.
//!
//! Reads a serial trace log (see `vector_phosphor::trace_log`), feeds every
//! plotted point into an engine driven by a reference SXGA raster, and
//! captures the final frame as a PPM image or an ASCII preview.

mod capture;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use capture::FrameCapture;
use vector_phosphor::ingest::MAX_BURST;
use vector_phosphor::{
    DrawEvent, Engine, EngineConfig, RasterScan, RasterTiming, ScanFlags, TraceReader,
};

#[derive(Parser)]
#[command(
    name = "phosphor-view",
    about = "Render a vector display pixel trace through the phosphor engine"
)]
struct Args {
    /// Trace log to read (stdin if omitted)
    input: Option<PathBuf>,

    /// Write the final frame as a binary PPM
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print an ASCII preview of the final frame
    #[arg(long)]
    ascii: bool,

    /// Frames to run after the whole trace has been ingested
    #[arg(short, long, default_value_t = 1)]
    frames: u32,

    /// Width of the ASCII preview in characters
    #[arg(long, default_value_t = 160)]
    max_width: usize,

    /// Disable the 3x3 smoothing kernel
    #[arg(long)]
    no_smoothing: bool,

    /// Treat host y as growing upwards
    #[arg(long)]
    flip_y: bool,

    /// Plot single points instead of plus-shaped clusters
    #[arg(long)]
    no_expand: bool,
}

fn load_events(args: &Args) -> vector_phosphor::Result<Vec<DrawEvent>> {
    let expand = !args.no_expand;
    match &args.input {
        Some(path) => {
            log::info!("Reading trace from {}", path.display());
            TraceReader::new(BufReader::new(File::open(path)?), expand).events()
        }
        None => TraceReader::new(io::stdin().lock(), expand).events(),
    }
}

/// Run the engine until every event is ingested and stored, then for
/// `args.frames` more frames, capturing the last one.
fn render(args: &Args, events: &[DrawEvent]) -> vector_phosphor::Result<FrameCapture> {
    let config = EngineConfig::default()
        .with_flip_y(args.flip_y)
        .with_smoothing(!args.no_smoothing);
    let mut engine = Engine::new(config)?;
    let mut capture = FrameCapture::default();

    let mut pending = events.iter();
    let mut next_event = pending.next();
    let mut frames_left = args.frames.max(1);
    let mut draining = true;

    for mut input in RasterScan::new(RasterTiming::SXGA_60) {
        if let Some(&event) = next_event {
            // Hold events back instead of letting the queue drop them.
            if engine.queue().available() >= MAX_BURST {
                input = input.with_draw_event(event);
                next_event = pending.next();
            }
        }

        let color = engine.tick(&input);
        if !draining && frames_left == 1 && input.is_visible() {
            capture.record(engine.transform(), &input, color);
        }

        if input.flags.contains(ScanFlags::END_OF_FRAME) {
            if draining {
                if next_event.is_none() && engine.queue().is_empty() {
                    draining = false;
                    log::info!(
                        "Trace ingested after {} frame(s), {} points live",
                        engine.stats().frames,
                        engine.ring_occupancy()
                    );
                }
            } else {
                frames_left -= 1;
                if frames_left == 0 {
                    break;
                }
            }
        }
    }

    let stats = engine.stats();
    log::info!(
        "{} frames, {} inserts, {} refreshes, {} dropped, {} paints in last frame",
        stats.frames,
        stats.inserts,
        stats.refreshes,
        stats.dropped_records,
        stats.paints_last_frame
    );
    Ok(capture)
}

fn run(args: &Args) -> vector_phosphor::Result<()> {
    let events = load_events(args)?;
    log::info!("Loaded {} draw events", events.len());

    let capture = render(args, &events)?;
    if !capture.has_content() {
        log::warn!("Final frame is empty");
    }

    if let Some(path) = &args.output {
        capture.write_ppm(BufWriter::new(File::create(path)?))?;
        log::info!("Wrote {}", path.display());
    }
    if args.ascii || args.output.is_none() {
        print!("{}", capture.to_ascii(args.max_width));
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
