//! Persistence and render engine for point-plotting vector displays.
//!
//! A host computation engine strobes "draw a point at (x, y)" events; this
//! crate keeps every plotted point alive in a bounded store, lets it fade the
//! way a long-persistence CRT phosphor does, and renders the result onto a
//! raster output one pixel per tick.
//!
//! # Pipeline
//!
//! - **Ingest queue** ([`ingest`]) - absorbs the host's irregular event rate,
//!   optionally expanding each point into a plus-shaped cluster.
//! - **Persistence ring** ([`ring`]) - four chained fixed-size segments; each
//!   tick every point hops forward, decays on a schedule, and the next queued
//!   point is either inserted, refreshed in place, or searched for.
//! - **Lookahead buffer** ([`lookahead`]) - an 8-line window that stages
//!   points just ahead of the beam and erases what the beam has passed.
//! - **Smoothing** ([`smoothing`]) - a 3x3 kernel that softens dim pixels.
//! - **Color mapper** ([`color`]) - green afterglow, blue-white flash.
//!
//! # Coordinate System
//!
//! Points use 10-bit display coordinates (0..1023 on both axes, origin top
//! left). Coordinates wrap rather than clip. The display window is placed in
//! the raster by [`EngineConfig::h_offset`] and [`EngineConfig::v_offset`].
//!
//! # Example
//!
//! ```
//! use vector_phosphor::{DrawEvent, Engine, EngineConfig, RasterScan, RasterTiming};
//!
//! let mut engine = Engine::new(EngineConfig::default()).unwrap();
//! let mut scan = RasterScan::new(RasterTiming::SXGA_60);
//!
//! let first = scan.next().unwrap().with_draw_event(DrawEvent::new(512, 512, 0, true));
//! engine.tick(&first);
//! for input in scan.take(10_000) {
//!     let _pixel = engine.tick(&input);
//! }
//! ```

pub mod color;
pub mod engine;
mod error;
pub mod host;
pub mod ingest;
pub mod lookahead;
pub mod ring;
pub mod scan;
pub mod smoothing;
pub mod trace_log;
pub mod types;

// Error types
pub use error::{Error, Result};

// Engine and its collaborators
pub use engine::Engine;
pub use host::{draw_channel, DrawEventReceiver, DrawEventSender};
pub use scan::{RasterScan, RasterTiming};
pub use trace_log::{TraceLine, TraceReader};

// Types
pub use types::{
    Brightness, DrawEvent, EngineConfig, EngineStats, IngestRecord, OverflowPolicy, Point, Rgb,
    ScanFlags, ScanInput,
};
