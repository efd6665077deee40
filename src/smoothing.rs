//! 3x3 smoothing stage.
//!
//! Two line buffers and a 3x3 register window turn the incoming sample stream
//! into a neighborhood centered one line and one column behind the newest
//! sample. Dim centers are averaged with their neighbors so fading points
//! blur into a glow; bright centers pass through unchanged.

/// Default center level at or above which smoothing is skipped.
pub const DEFAULT_THRESHOLD: u8 = 242;

/// Approximate 3x3 average of a neighborhood, `window[row][col]` with row 0
/// the oldest line and `window[2][2]` the newest sample.
///
/// Corners on the main diagonal count half so the sum fits in 11 bits, and the
/// divide by 9 is replaced with a shift by 3.
#[inline]
pub fn kernel(window: &[[u8; 3]; 3]) -> u8 {
    let [[p11, p12, p13], [p21, p22, p23], [p31, p32, p33]] = *window;
    let sum = (p11 as u16 >> 1)
        + p12 as u16
        + p13 as u16
        + p21 as u16
        + p22 as u16
        + p23 as u16
        + p31 as u16
        + p32 as u16
        + (p33 as u16 >> 1);
    (sum >> 3) as u8
}

/// Line-buffered 3x3 smoothing filter, fed one sample per tick.
pub struct Smoother {
    /// Samples from the previous line, indexed by raster column.
    prev: Vec<u8>,
    /// Samples from two lines back.
    prev2: Vec<u8>,
    window: [[u8; 3]; 3],
    threshold: u8,
    enabled: bool,
}

impl Smoother {
    /// `width` must cover a full raster line including blanking.
    pub fn new(width: usize, threshold: u8, enabled: bool) -> Self {
        Self {
            prev: vec![0; width],
            prev2: vec![0; width],
            window: [[0; 3]; 3],
            threshold,
            enabled,
        }
    }

    /// Shift in the sample for raster column `h` and return the output for the
    /// window center, which lags the input by one line and one column.
    pub fn push(&mut self, h: u16, sample: u8) -> u8 {
        let col = h as usize % self.prev.len();
        let top = self.prev2[col];
        let mid = self.prev[col];
        self.prev2[col] = mid;
        self.prev[col] = sample;

        for (row, incoming) in self.window.iter_mut().zip([top, mid, sample]) {
            row[0] = row[1];
            row[1] = row[2];
            row[2] = incoming;
        }

        let center = self.window[1][1];
        if !self.enabled || center >= self.threshold {
            center
        } else {
            kernel(&self.window)
        }
    }

    /// Current 3x3 neighborhood, `window[1][1]` being the center.
    pub fn window(&self) -> &[[u8; 3]; 3] {
        &self.window
    }

    /// Length of the line buffers in raster columns.
    pub fn width(&self) -> usize {
        self.prev.len()
    }

    /// Grow or shrink the line buffers to `width` columns. Existing samples
    /// keep their columns; new columns start dark.
    pub fn resize(&mut self, width: usize) {
        self.prev.resize(width, 0);
        self.prev2.resize(width, 0);
    }

    /// Zero the line buffers and the window.
    pub fn clear(&mut self) {
        self.prev.fill(0);
        self.prev2.fill(0);
        self.window = [[0; 3]; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed a `lines` x `width` image row by row; return the output image.
    fn run(smoother: &mut Smoother, image: &[Vec<u8>]) -> Vec<Vec<u8>> {
        image
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(h, &s)| smoother.push(h as u16, s))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_resize_realigns_wide_lines() {
        let mut image = vec![vec![0u8; 12]; 5];
        image[2][2] = 255;

        // Buffers shorter than the line fold columns 8..12 onto 0..4.
        let mut short = Smoother::new(8, DEFAULT_THRESHOLD, true);
        assert_ne!(run(&mut short, &image)[3][3], 255);

        let mut grown = Smoother::new(8, DEFAULT_THRESHOLD, true);
        grown.resize(12);
        assert_eq!(grown.width(), 12);
        assert_eq!(run(&mut grown, &image)[3][3], 255);
    }

    #[test]
    fn test_kernel_flat_field() {
        // 7 full + 2 half weights = 8 units, so a flat field is preserved.
        assert_eq!(kernel(&[[200; 3]; 3]), 200);
        assert_eq!(kernel(&[[0; 3]; 3]), 0);
    }

    #[test]
    fn test_kernel_never_overflows() {
        assert_eq!(kernel(&[[255; 3]; 3]), 254);
    }

    #[test]
    fn test_kernel_corner_weights() {
        let mut w = [[0u8; 3]; 3];
        w[0][0] = 160;
        assert_eq!(kernel(&w), 10);
        w[0][0] = 0;
        w[0][2] = 160;
        assert_eq!(kernel(&w), 20);
    }

    #[test]
    fn test_dim_point_blurs() {
        let mut smoother = Smoother::new(8, DEFAULT_THRESHOLD, true);
        let mut image = vec![vec![0u8; 8]; 5];
        image[2][4] = 160;
        let out = run(&mut smoother, &image);
        // Output lags one line and one column: the point shows at (3, 5).
        assert_eq!(out[3][5], 20);
        // Neighbors pick up some of the glow.
        assert_eq!(out[3][4], 20);
        assert_eq!(out[4][5], 20);
        assert_eq!(out[4][6], 10);
    }

    #[test]
    fn test_bright_center_passes_through() {
        let mut smoother = Smoother::new(8, DEFAULT_THRESHOLD, true);
        let mut image = vec![vec![0u8; 8]; 5];
        image[2][4] = 250;
        let out = run(&mut smoother, &image);
        assert_eq!(out[3][5], 250);
    }

    #[test]
    fn test_disabled_is_pure_delay() {
        let mut smoother = Smoother::new(8, DEFAULT_THRESHOLD, false);
        let mut image = vec![vec![0u8; 8]; 5];
        image[1][2] = 30;
        let out = run(&mut smoother, &image);
        assert_eq!(out[2][3], 30);
        let lit: usize = out.iter().flatten().filter(|&&v| v != 0).count();
        assert_eq!(lit, 1);
    }
}
