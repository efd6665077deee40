//! Frame capture for offline rendering.
//!
//! Collects one frame of engine output over the display window and writes it
//! out as a binary PPM or as a coarse ASCII preview.

use std::io::{self, Write};

use vector_phosphor::color::CoordinateTransform;
use vector_phosphor::types::COORD_RANGE;
use vector_phosphor::{Rgb, ScanInput};

/// Characters from dark to bright for the ASCII preview.
const ASCII_RAMP: &[u8] = b" .:-=+*#@";

/// Display-sized RGB frame.
pub struct FrameCapture {
    /// Row-major, `y * width + x`.
    pixels: Vec<Rgb>,
    width: usize,
    height: usize,
}

impl FrameCapture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; width * height],
            width,
            height,
        }
    }

    /// True if any pixel is lit.
    pub fn has_content(&self) -> bool {
        self.pixels.iter().any(|&p| p != Rgb::BLACK)
    }

    /// Store the pixel produced for `input`, if it falls inside the display.
    pub fn record(&mut self, transform: &CoordinateTransform, input: &ScanInput, color: Rgb) {
        let x = transform.display_x(input.h);
        let y = transform.display_y(input.v);
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    /// Write a binary (P6) PPM.
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            bytes.extend_from_slice(&[p.r, p.g, p.b]);
        }
        out.write_all(&bytes)?;
        out.flush()
    }

    /// Downsample to at most `max_width` columns of text.
    ///
    /// Each character covers a block of pixels and shows the brightest green
    /// value in it. Blocks are twice as tall as they are wide to roughly match
    /// terminal cell proportions.
    pub fn to_ascii(&self, max_width: usize) -> String {
        let block = self.width.div_ceil(max_width.max(1)).max(1);
        let block_h = block * 2;
        let cols = self.width.div_ceil(block);
        let rows = self.height.div_ceil(block_h);

        let mut out = String::with_capacity((cols + 1) * rows);
        for row in 0..rows {
            for col in 0..cols {
                let mut peak = 0u8;
                for y in row * block_h..((row + 1) * block_h).min(self.height) {
                    for x in col * block..((col + 1) * block).min(self.width) {
                        peak = peak.max(self.get(x, y).g);
                    }
                }
                let idx = peak as usize * (ASCII_RAMP.len() - 1) / 255;
                out.push(ASCII_RAMP[idx] as char);
            }
            out.push('\n');
        }
        out
    }
}

impl Default for FrameCapture {
    fn default() -> Self {
        Self::new(COORD_RANGE as usize, COORD_RANGE as usize)
    }
}
