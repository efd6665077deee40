//! Shared value types for the phosphor pipeline.
//!
//! Points, host draw events, per-tick scan samples, output colors, and the
//! engine configuration all live here so every stage speaks the same types.

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of addressable positions along each display axis (10-bit).
pub const COORD_RANGE: u16 = 1024;

/// Mask applied to every coordinate; coordinates wrap instead of clipping.
pub const COORD_MASK: u16 = COORD_RANGE - 1;

/// Luma written for a freshly inserted or refreshed point (12-bit full scale).
pub const LUMA_MAX: u16 = 4095;

/// Largest raster line length the smoothing stage will accept.
pub const MAX_RASTER_WIDTH: usize = 4096;

// =============================================================================
// Points
// =============================================================================

/// A plotted point with a fading 12-bit brightness.
///
/// A point is dead once the top 8 bits of its luma are zero (`luma < 16`).
/// Dead points keep their coordinates but are logically absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Column, 0..1023
    pub x: u16,
    /// Row, 0..1023
    pub y: u16,
    /// Brightness, 0..4095
    pub luma: u16,
}

impl Point {
    /// The placeholder stored in empty slots.
    pub const EMPTY: Point = Point { x: 0, y: 0, luma: 0 };

    /// Creates a new point, masking each field to its bit width.
    pub const fn new(x: u16, y: u16, luma: u16) -> Self {
        Self {
            x: x & COORD_MASK,
            y: y & COORD_MASK,
            luma: if luma > LUMA_MAX { LUMA_MAX } else { luma },
        }
    }

    /// Returns true once the point has faded below visibility.
    #[inline]
    pub const fn is_dead(&self) -> bool {
        self.luma >> 4 == 0
    }

    /// Returns true if the point is still visible.
    #[inline]
    pub const fn is_live(&self) -> bool {
        !self.is_dead()
    }

    /// 8-bit display intensity (top 8 bits of luma).
    #[inline]
    pub const fn intensity(&self) -> u8 {
        (self.luma >> 4) as u8
    }

    /// Returns true if this point sits at the given coordinates.
    #[inline]
    pub const fn is_at(&self, x: u16, y: u16) -> bool {
        self.x == x && self.y == y
    }
}

/// 3-bit host brightness. 0 is brightest, 7 is dimmest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Brightness(u8);

impl Brightness {
    /// Dimmest level; events at this level are never expanded into clusters.
    pub const MIN: Brightness = Brightness(7);
    /// Brightest level.
    pub const MAX: Brightness = Brightness(0);

    /// Creates a brightness level, keeping the low 3 bits.
    pub const fn new(level: u8) -> Self {
        Self(level & 0x07)
    }

    /// Returns the raw 3-bit level.
    pub const fn level(&self) -> u8 {
        self.0
    }

    /// Returns true for the dimmest level.
    pub const fn is_min(&self) -> bool {
        self.0 == Self::MIN.0
    }
}

impl From<u8> for Brightness {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

// =============================================================================
// Host Events
// =============================================================================

/// A single "draw a point" request from the host computation engine.
///
/// Delivered as one atomic sample per tick; all fields travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawEvent {
    /// Host column, 10 bits.
    pub x: u16,
    /// Host row, 10 bits.
    pub y: u16,
    pub brightness: Brightness,
    /// Expand into a plus-shaped cluster (ignored at minimum brightness).
    pub expand: bool,
}

impl DrawEvent {
    /// Creates a draw event with coordinates masked to 10 bits.
    pub fn new(x: u16, y: u16, brightness: u8, expand: bool) -> Self {
        Self {
            x: x & COORD_MASK,
            y: y & COORD_MASK,
            brightness: Brightness::new(brightness),
            expand,
        }
    }
}

/// One queued point awaiting insertion or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IngestRecord {
    pub x: u16,
    pub y: u16,
    pub brightness: Brightness,
}

impl IngestRecord {
    pub fn new(x: u16, y: u16, brightness: Brightness) -> Self {
        Self {
            x: x & COORD_MASK,
            y: y & COORD_MASK,
            brightness,
        }
    }
}

// =============================================================================
// Scan Input / Output
// =============================================================================

bitflags! {
    /// Frame boundary signals sampled from the scan generator each tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct ScanFlags: u8 {
        /// The current position is inside the visible area.
        const VISIBLE = 0b0000_0001;
        /// This tick is the last one of a scanline.
        const END_OF_LINE = 0b0000_0010;
        /// This tick is the last one of a frame.
        const END_OF_FRAME = 0b0000_0100;
    }
}

/// Everything the engine samples from its collaborators on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanInput {
    /// Raster column.
    pub h: u16,
    /// Raster row.
    pub v: u16,
    pub flags: ScanFlags,
    /// Point strobed by the host on this tick, if any.
    pub draw_event: Option<DrawEvent>,
}

impl ScanInput {
    /// A sample with no draw event attached.
    pub fn new(h: u16, v: u16, flags: ScanFlags) -> Self {
        Self {
            h,
            v,
            flags,
            draw_event: None,
        }
    }

    /// Attach a host draw event to this tick (builder pattern).
    pub fn with_draw_event(mut self, event: DrawEvent) -> Self {
        self.draw_event = Some(event);
        self
    }

    /// Returns true inside the visible area.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(ScanFlags::VISIBLE)
    }
}

/// Output pixel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Output outside the visible area and for unlit pixels.
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// What the ingest queue does when a new burst does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OverflowPolicy {
    /// Evict the oldest unconsumed bursts until the new one fits.
    #[default]
    DropOldest,
    /// Discard the incoming event and keep the queue as-is.
    DropNewest,
}

/// Configuration for building an [`Engine`](crate::Engine).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Raster column where display column 0 starts.
    pub h_offset: u16,
    /// Raster row where display row 0 starts.
    pub v_offset: u16,
    /// Length of the smoothing line buffers. Must cover the full raster line
    /// (including blanking) so columns line up from one line to the next.
    pub raster_width: usize,
    /// Mirror host y (y-up) into raster order (y-down).
    pub flip_y: bool,
    /// Allow draw events to expand into plus-shaped clusters.
    pub allow_expansion: bool,
    /// Enable the 3x3 smoothing kernel.
    pub smoothing: bool,
    /// Center samples at or above this level bypass the smoothing kernel.
    pub smoothing_threshold: u8,
    /// Ingest overflow behavior.
    pub overflow: OverflowPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Centers the 1024-wide display inside a 1280-wide visible area.
            h_offset: 128,
            v_offset: 0,
            raster_width: 2048,
            flip_y: false,
            allow_expansion: true,
            smoothing: true,
            smoothing_threshold: 242,
            overflow: OverflowPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the display window at the given raster origin.
    pub fn new(h_offset: u16, v_offset: u16) -> Self {
        Self {
            h_offset,
            v_offset,
            ..Default::default()
        }
    }

    /// Set the smoothing line length (builder pattern).
    pub fn with_raster_width(mut self, raster_width: usize) -> Self {
        self.raster_width = raster_width;
        self
    }

    /// Mirror host y coordinates (builder pattern).
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Enable or disable cluster expansion (builder pattern).
    pub fn with_expansion(mut self, allow: bool) -> Self {
        self.allow_expansion = allow;
        self
    }

    /// Enable or disable the smoothing kernel (builder pattern).
    pub fn with_smoothing(mut self, enable: bool) -> Self {
        self.smoothing = enable;
        self
    }

    /// Set the smoothing bypass threshold (builder pattern).
    pub fn with_smoothing_threshold(mut self, threshold: u8) -> Self {
        self.smoothing_threshold = threshold;
        self
    }

    /// Set the ingest overflow policy (builder pattern).
    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Check the configuration for values the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.h_offset == 0 {
            // The smoothing window needs one column of border left of the display.
            return Err(Error::invalid_config("h_offset must be at least 1"));
        }
        if self.raster_width == 0 {
            return Err(Error::invalid_config("raster_width must be non-zero"));
        }
        if self.raster_width > MAX_RASTER_WIDTH {
            return Err(Error::invalid_config(format!(
                "raster_width {} exceeds maximum {}",
                self.raster_width, MAX_RASTER_WIDTH
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Read-only diagnostic counters. These never affect rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineStats {
    /// Records currently waiting in the ingest queue.
    pub queue_depth: usize,
    /// Records discarded because the ingest queue was full.
    pub dropped_records: u64,
    /// Points written into empty ring slots.
    pub inserts: u64,
    /// Points re-brightened in place.
    pub refreshes: u64,
    /// Lookahead cells painted since construction or the last reset.
    pub paints: u64,
    /// Lookahead cells painted during the current frame.
    pub paints_this_frame: u64,
    /// Lookahead cells painted during the last completed frame.
    pub paints_last_frame: u64,
    /// Lookahead cells cleared by the erase cursor.
    pub erase_steps: u64,
    /// Completed scanlines.
    pub passes: u64,
    /// Completed frames.
    pub frames: u64,
}
