//! Scanline lookahead buffer.
//!
//! An 8-line sliding window of intensity cells keyed by `(y mod 8, x)`. Every
//! tick, points seen at the ring taps whose row falls inside the next eight
//! lines are painted in; when nothing needs painting, an erase cursor trailing
//! the scan beam clears the row that was just displayed.

use crate::ring::TAP_COUNT;
use crate::types::{Point, COORD_RANGE};

/// Lines held by the window.
pub const LOOKAHEAD_LINES: usize = 8;

/// Cells per line.
pub const LINE_WIDTH: usize = COORD_RANGE as usize;

/// What the lookahead stage did on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookaheadAction {
    /// A tap point was written into its cell.
    Painted { x: u16, y: u16, intensity: u8 },
    /// The erase cursor cleared column `x` of the current row.
    Erased { x: u16 },
    /// Nothing to paint and the erase cursor is level with the beam.
    Idle,
}

/// Eight lines of 8-bit intensity cells staged ahead of the scan beam.
pub struct LookaheadBuffer {
    cells: Box<[[u8; LINE_WIDTH]; LOOKAHEAD_LINES]>,
    erase_cursor: u16,
}

impl LookaheadBuffer {
    /// An empty window with the erase cursor at column 0.
    pub fn new() -> Self {
        Self {
            cells: Box::new([[0; LINE_WIDTH]; LOOKAHEAD_LINES]),
            erase_cursor: 0,
        }
    }

    /// Paint at most one tap into the window, or erase one cell.
    ///
    /// `scan_y` is the display line currently being read and `scan_x` the
    /// column about to be read; both may lie outside the display during
    /// blanking. Taps are checked in the order given, so the caller's
    /// priority order decides which point wins on a tick with several
    /// candidates. Painting always takes precedence over erasing.
    ///
    /// Cells of the current line left of `scan_x` are not painted: the beam
    /// has passed them, and the value would otherwise sit in the shared row
    /// until line `scan_y + 8` is read.
    pub fn step(&mut self, taps: &[Point; TAP_COUNT], scan_y: i32, scan_x: i32) -> LookaheadAction {
        let window = scan_y..scan_y + LOOKAHEAD_LINES as i32;
        let paintable = |p: &&Point| {
            let (x, y) = (p.x as i32, p.y as i32);
            p.is_live() && window.contains(&y) && !(y == scan_y && x < scan_x)
        };
        if let Some(p) = taps.iter().find(paintable) {
            let intensity = p.intensity();
            self.cells[row_of(p.y as i32)][p.x as usize] = intensity;
            return LookaheadAction::Painted {
                x: p.x,
                y: p.y,
                intensity,
            };
        }

        let limit = scan_x.clamp(0, LINE_WIDTH as i32);
        if (self.erase_cursor as i32) < limit {
            let x = self.erase_cursor;
            self.cells[row_of(scan_y)][x as usize] = 0;
            self.erase_cursor += 1;
            return LookaheadAction::Erased { x };
        }

        LookaheadAction::Idle
    }

    /// Intensity stored for display position `(x, y)`; zero outside the display.
    #[inline]
    pub fn read(&self, y: i32, x: i32) -> u8 {
        if !(0..LINE_WIDTH as i32).contains(&x) || !(0..COORD_RANGE as i32).contains(&y) {
            return 0;
        }
        self.cells[row_of(y)][x as usize]
    }

    /// Restart the erase cursor at column 0 for the next line.
    pub fn end_of_line(&mut self) {
        self.erase_cursor = 0;
    }

    /// Next column the erase cursor will clear.
    pub fn erase_cursor(&self) -> u16 {
        self.erase_cursor
    }

    /// Number of non-zero cells in the window.
    pub fn lit_cells(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|&&c| c != 0)
            .count()
    }

    /// Zero every cell and rewind the erase cursor.
    pub fn clear(&mut self) {
        for row in self.cells.iter_mut() {
            row.fill(0);
        }
        self.erase_cursor = 0;
    }
}

impl Default for LookaheadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn row_of(y: i32) -> usize {
    y.rem_euclid(LOOKAHEAD_LINES as i32) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LUMA_MAX;

    fn taps_with(entries: &[(usize, Point)]) -> [Point; TAP_COUNT] {
        let mut taps = [Point::EMPTY; TAP_COUNT];
        for &(i, p) in entries {
            taps[i] = p;
        }
        taps
    }

    #[test]
    fn test_paints_point_inside_window() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[(3, Point::new(40, 105, LUMA_MAX))]);
        let action = buf.step(&taps, 100, 0);
        assert_eq!(
            action,
            LookaheadAction::Painted {
                x: 40,
                y: 105,
                intensity: 255
            }
        );
        assert_eq!(buf.read(105, 40), 255);
    }

    #[test]
    fn test_ignores_points_outside_window() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[
            (0, Point::new(1, 99, LUMA_MAX)),
            (1, Point::new(1, 108, LUMA_MAX)),
            (2, Point::new(1, 102, 10)), // dead
        ]);
        assert_eq!(buf.step(&taps, 100, 0), LookaheadAction::Idle);
        assert_eq!(buf.lit_cells(), 0);
    }

    #[test]
    fn test_lowest_tap_wins_same_cell() {
        let mut buf = LookaheadBuffer::new();
        // Two candidates for the same cell on one tick: segment 0 tap 6 and
        // segment 2 tap 1. Only the former is written.
        let taps = taps_with(&[
            (6, Point::new(20, 3, 0x800)),
            (17, Point::new(20, 3, LUMA_MAX)),
        ]);
        buf.step(&taps, 0, 0);
        assert_eq!(buf.read(3, 20), 0x80);
    }

    #[test]
    fn test_one_paint_per_tick() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[
            (9, Point::new(5, 1, LUMA_MAX)),
            (2, Point::new(6, 2, LUMA_MAX)),
        ]);
        buf.step(&taps, 0, 0);
        assert_eq!(buf.read(2, 6), 255);
        assert_eq!(buf.read(1, 5), 0);
        assert_eq!(buf.lit_cells(), 1);
    }

    #[test]
    fn test_erase_trails_scan_column() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[(0, Point::new(2, 8, LUMA_MAX))]);
        buf.step(&taps, 8, 0);
        assert_eq!(buf.read(8, 2), 255);

        let empty = [Point::EMPTY; TAP_COUNT];
        // Cursor may not pass the scan column.
        assert_eq!(buf.step(&empty, 8, 0), LookaheadAction::Idle);
        for x in 0..3 {
            assert_eq!(buf.step(&empty, 8, 3), LookaheadAction::Erased { x });
        }
        assert_eq!(buf.step(&empty, 8, 3), LookaheadAction::Idle);
        assert_eq!(buf.read(8, 2), 0);
    }

    #[test]
    fn test_paint_preempts_erase() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[(4, Point::new(100, 12, LUMA_MAX))]);
        assert!(matches!(
            buf.step(&taps, 10, 500),
            LookaheadAction::Painted { .. }
        ));
        assert_eq!(buf.erase_cursor(), 0);
    }

    #[test]
    fn test_skips_cells_behind_beam() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[
            (0, Point::new(10, 50, LUMA_MAX)),
            (1, Point::new(30, 50, LUMA_MAX)),
        ]);
        // Column 10 of line 50 has already been read; column 30 has not.
        assert_eq!(
            buf.step(&taps, 50, 20),
            LookaheadAction::Painted {
                x: 30,
                y: 50,
                intensity: 255
            }
        );
        assert_eq!(buf.read(50, 10), 0);
        // The same point is fine to paint for a line further ahead.
        let taps = taps_with(&[(0, Point::new(10, 51, LUMA_MAX))]);
        assert!(matches!(buf.step(&taps, 50, 20), LookaheadAction::Painted { .. }));
    }

    #[test]
    fn test_end_of_line_resets_cursor() {
        let mut buf = LookaheadBuffer::new();
        let empty = [Point::EMPTY; TAP_COUNT];
        for _ in 0..10 {
            buf.step(&empty, 0, 10);
        }
        assert_eq!(buf.erase_cursor(), 10);
        buf.end_of_line();
        assert_eq!(buf.erase_cursor(), 0);
    }

    #[test]
    fn test_window_keyed_by_row_modulo() {
        let mut buf = LookaheadBuffer::new();
        let taps = taps_with(&[(0, Point::new(7, 13, LUMA_MAX))]);
        buf.step(&taps, 10, 0);
        // Rows 13 and 5 share a physical line; only in-range reads are valid.
        assert_eq!(buf.read(13, 7), 255);
        assert_eq!(buf.read(-1, 7), 0);
        assert_eq!(buf.read(13, 1024), 0);
    }
}
