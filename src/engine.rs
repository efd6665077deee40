//! The per-tick pipeline.
//!
//! One call to [`Engine::tick`] is one output pixel's worth of work:
//!
//! 1. a strobed draw event, if any, enters the ingest queue;
//! 2. the persistence ring hops every segment and runs its scheduler;
//! 3. the lookahead buffer paints one tap or erases one cell, then yields the
//!    sample one line and one column ahead of the beam;
//! 4. the smoothing stage delays that sample by one line and one column, which
//!    brings it back in line with the beam;
//! 5. the color mapper produces the pixel.
//!
//! Every step does a fixed amount of work and nothing allocates after
//! construction.

use crate::color::{phosphor_color, CoordinateTransform};
use crate::error::Result;
use crate::host::DrawEventReceiver;
use crate::ingest::IngestQueue;
use crate::lookahead::{LookaheadAction, LookaheadBuffer};
use crate::ring::{PersistenceRing, RingAction};
use crate::smoothing::Smoother;
use crate::types::{EngineConfig, EngineStats, Rgb, ScanFlags, ScanInput};

/// Scanlines between decay steps.
pub const DECAY_PASS_INTERVAL: u32 = 8;

/// The whole render pipeline and its state.
///
/// Owns every stage exclusively. Drive it with one [`tick`](Self::tick) per
/// output pixel; nothing else mutates the store.
pub struct Engine {
    config: EngineConfig,
    transform: CoordinateTransform,
    queue: IngestQueue,
    ring: PersistenceRing,
    lookahead: LookaheadBuffer,
    smoother: Smoother,
    /// Completed scanlines; gates decay.
    pass_counter: u32,
    /// Lines per frame, learned from the first end-of-frame signal.
    frame_lines: Option<u16>,
    stats: EngineStats,
}

impl Engine {
    /// Build an engine with an empty store.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let transform = CoordinateTransform::new(config.h_offset, config.v_offset, config.flip_y);
        Ok(Self {
            transform,
            queue: IngestQueue::new(config.overflow),
            ring: PersistenceRing::new(),
            lookahead: LookaheadBuffer::new(),
            smoother: Smoother::new(
                config.raster_width,
                config.smoothing_threshold,
                config.smoothing,
            ),
            pass_counter: 0,
            frame_lines: None,
            stats: EngineStats::default(),
            config,
        })
    }

    /// Advance the pipeline by one tick and return the pixel for `input`'s
    /// scan position.
    pub fn tick(&mut self, input: &ScanInput) -> Rgb {
        if let Some(event) = input.draw_event {
            let (x, y) = self.transform.host_to_display(event.x, event.y);
            let expand = event.expand && self.config.allow_expansion;
            self.queue.enqueue(x, y, event.brightness, expand);
        }

        let decay_now = self.pass_counter % DECAY_PASS_INTERVAL == 0;
        match self.ring.tick(&mut self.queue, decay_now) {
            RingAction::Inserted { .. } => self.stats.inserts += 1,
            RingAction::Refreshed { .. } => self.stats.refreshes += 1,
            _ => {}
        }

        let read_y = self.transform.display_y(self.next_line(input.v));
        let read_x = self.transform.display_x(input.h) + 1;
        match self.lookahead.step(&self.ring.taps(), read_y, read_x) {
            LookaheadAction::Painted { .. } => {
                self.stats.paints += 1;
                self.stats.paints_this_frame += 1;
            }
            LookaheadAction::Erased { .. } => self.stats.erase_steps += 1,
            LookaheadAction::Idle => {}
        }
        let sample = self.lookahead.read(read_y, read_x);

        let intensity = self.smoother.push(input.h, sample);
        let color = phosphor_color(intensity, input.is_visible());

        if input.flags.contains(ScanFlags::END_OF_LINE) {
            self.end_of_line(input.h);
        }
        if input.flags.contains(ScanFlags::END_OF_FRAME) {
            self.end_of_frame(input.v);
        }
        color
    }

    /// Like [`tick`](Self::tick), pulling the draw event from a host channel
    /// when `input` carries none.
    pub fn tick_with(&mut self, input: &ScanInput, events: &DrawEventReceiver) -> Rgb {
        if input.draw_event.is_none() {
            if let Some(event) = events.poll() {
                return self.tick(&input.with_draw_event(event));
            }
        }
        self.tick(input)
    }

    /// Raster row after `v`, wrapping once the frame height is known.
    #[inline]
    fn next_line(&self, v: u16) -> u16 {
        let next = v.wrapping_add(1);
        match self.frame_lines {
            Some(lines) if next >= lines => 0,
            _ => next,
        }
    }

    fn end_of_line(&mut self, h: u16) {
        let line_len = h as usize + 1;
        if line_len > self.smoother.width() {
            log::warn!(
                "raster line is {} ticks but raster_width is {}; growing smoothing buffers",
                line_len,
                self.smoother.width()
            );
            self.smoother.resize(line_len);
        }
        self.pass_counter = self.pass_counter.wrapping_add(1);
        self.stats.passes += 1;
        self.lookahead.end_of_line();
    }

    fn end_of_frame(&mut self, v: u16) {
        if self.frame_lines.is_none() {
            log::debug!("frame height detected: {} lines", v.wrapping_add(1));
        }
        self.frame_lines = Some(v.wrapping_add(1));
        self.stats.frames += 1;
        self.stats.paints_last_frame = self.stats.paints_this_frame;
        self.stats.paints_this_frame = 0;
        log::debug!(
            "frame {}: {} paints, queue depth {}, {} inserts, {} refreshes, {} dropped",
            self.stats.frames,
            self.stats.paints_last_frame,
            self.queue.len(),
            self.stats.inserts,
            self.stats.refreshes,
            self.queue.dropped()
        );
    }

    /// Return the store to empty, as after power-up.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.ring.reset();
        self.lookahead.clear();
        self.smoother.clear();
        self.pass_counter = 0;
        self.stats = EngineStats::default();
        log::debug!("engine reset");
    }

    /// Snapshot of the diagnostic counters.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            queue_depth: self.queue.len(),
            dropped_records: self.queue.dropped(),
            ..self.stats.clone()
        }
    }

    /// Live points in the ring. Scans the whole store.
    pub fn ring_occupancy(&self) -> usize {
        self.ring.live_count()
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mapping between raster positions and display coordinates.
    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    /// Records waiting for insertion or refresh.
    pub fn queue(&self) -> &IngestQueue {
        &self.queue
    }

    /// The persistence store.
    pub fn ring(&self) -> &PersistenceRing {
        &self.ring
    }

    /// The 8-line staging window.
    pub fn lookahead(&self) -> &LookaheadBuffer {
        &self.lookahead
    }

    /// Scanlines completed since construction or the last reset.
    pub fn pass_counter(&self) -> u32 {
        self.pass_counter
    }
}
