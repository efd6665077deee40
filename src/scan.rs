//! Reference raster scan generator.
//!
//! Real hosts drive the engine from their own video timing. This generator
//! produces the same per-tick samples for tests and offline tools: the
//! position walks every column of every line, flagging the visible area, the
//! last tick of each line and the last tick of each frame.

use crate::types::{ScanFlags, ScanInput};

/// Line and frame geometry in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterTiming {
    /// Ticks per line, including horizontal blanking.
    pub h_total: u16,
    /// Lines per frame, including vertical blanking.
    pub v_total: u16,
    /// Visible columns at the start of each line.
    pub h_visible: u16,
    /// Visible lines at the start of each frame.
    pub v_visible: u16,
}

impl RasterTiming {
    /// 1280x1024 at 60 Hz (108 MHz pixel clock).
    pub const SXGA_60: RasterTiming = RasterTiming {
        h_total: 1688,
        v_total: 1066,
        h_visible: 1280,
        v_visible: 1024,
    };

    /// Custom geometry; visible counts must not exceed the totals.
    pub const fn new(h_total: u16, v_total: u16, h_visible: u16, v_visible: u16) -> Self {
        Self {
            h_total,
            v_total,
            h_visible,
            v_visible,
        }
    }

    /// Ticks in one full frame.
    pub fn ticks_per_frame(&self) -> u64 {
        self.h_total as u64 * self.v_total as u64
    }
}

impl Default for RasterTiming {
    fn default() -> Self {
        Self::SXGA_60
    }
}

/// Endless iterator over scan samples.
#[derive(Debug, Clone)]
pub struct RasterScan {
    timing: RasterTiming,
    h: u16,
    v: u16,
}

impl RasterScan {
    /// Start at the top-left corner of a frame.
    pub fn new(timing: RasterTiming) -> Self {
        Self { timing, h: 0, v: 0 }
    }

    pub fn timing(&self) -> &RasterTiming {
        &self.timing
    }

    /// Position of the next sample.
    pub fn position(&self) -> (u16, u16) {
        (self.h, self.v)
    }
}

impl Iterator for RasterScan {
    type Item = ScanInput;

    fn next(&mut self) -> Option<ScanInput> {
        let t = &self.timing;
        let (h, v) = (self.h, self.v);

        let mut flags = ScanFlags::empty();
        if h < t.h_visible && v < t.v_visible {
            flags |= ScanFlags::VISIBLE;
        }
        if h + 1 == t.h_total {
            flags |= ScanFlags::END_OF_LINE;
            if v + 1 == t.v_total {
                flags |= ScanFlags::END_OF_FRAME;
            }
        }

        self.h += 1;
        if self.h == t.h_total {
            self.h = 0;
            self.v += 1;
            if self.v == t.v_total {
                self.v = 0;
            }
        }

        Some(ScanInput::new(h, v, flags))
    }
}
