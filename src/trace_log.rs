//! Reader for the host's serial pixel trace.
//!
//! The host can log every plotted point over its debug UART, one line each:
//!
//! ```text
//! P:123 X:512 Y:300 B:3 R:1020
//! F:1a PC:0377
//! ```
//!
//! `P` is a running pixel number, `X`/`Y` the 10-bit coordinates, `B` the 3-bit
//! brightness and the optional `R` the ring position at the time. `F`/`PC`
//! lines mark frame boundaries (both fields hex). Anything else on the link,
//! such as boot chatter or a line cut short, is skipped.

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::types::{DrawEvent, COORD_MASK};

/// One recognized trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLine {
    Pixel { index: u32, event: DrawEvent },
    Frame { frame: u32, pc: u32 },
}

/// Parse a single line; `line_no` is 1-based and only used in errors.
///
/// A line is a record only when every field of the record is present and
/// numeric. Anything else, including a line cut short on the link, yields
/// `Ok(None)`. Complete records with out-of-range values are errors.
pub fn parse_line(line: &str, line_no: usize, expand: bool) -> Result<Option<TraceLine>> {
    let mut fields = Fields::default();
    for token in line.split_whitespace() {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        match key {
            "P" => fields.pixel = Some(value),
            "X" => fields.x = Some(value),
            "Y" => fields.y = Some(value),
            "B" => fields.b = Some(value),
            "F" => fields.frame = Some(value),
            "PC" => fields.pc = Some(value),
            _ => {}
        }
    }

    if let (Some(index), Some(x), Some(y), Some(b)) = (
        decimal(fields.pixel),
        decimal(fields.x),
        decimal(fields.y),
        decimal(fields.b),
    ) {
        if x > COORD_MASK as u32 || y > COORD_MASK as u32 {
            return Err(Error::parse(line_no, format!("coordinate out of range: ({}, {})", x, y)));
        }
        if b > 7 {
            return Err(Error::parse(line_no, format!("brightness out of range: {}", b)));
        }
        let event = DrawEvent::new(x as u16, y as u16, b as u8, expand);
        return Ok(Some(TraceLine::Pixel { index, event }));
    }
    if let (Some(frame), Some(pc)) = (hex(fields.frame), hex(fields.pc)) {
        return Ok(Some(TraceLine::Frame { frame, pc }));
    }
    if fields.any() {
        log::trace!("skipping incomplete trace line {}: {:?}", line_no, line.trim_end());
    }
    Ok(None)
}

/// Raw values of the recognized keys on one line.
#[derive(Default)]
struct Fields<'a> {
    pixel: Option<&'a str>,
    x: Option<&'a str>,
    y: Option<&'a str>,
    b: Option<&'a str>,
    frame: Option<&'a str>,
    pc: Option<&'a str>,
}

impl Fields<'_> {
    fn any(&self) -> bool {
        [self.pixel, self.x, self.y, self.b, self.frame, self.pc]
            .iter()
            .any(Option::is_some)
    }
}

fn decimal(value: Option<&str>) -> Option<u32> {
    value?.parse().ok()
}

fn hex(value: Option<&str>) -> Option<u32> {
    u32::from_str_radix(value?, 16).ok()
}

/// Iterator over the trace records of a reader.
pub struct TraceReader<R> {
    reader: R,
    line_no: usize,
    expand: bool,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    /// `expand` is copied into every produced [`DrawEvent`].
    pub fn new(reader: R, expand: bool) -> Self {
        Self {
            reader,
            line_no: 0,
            expand,
            buf: String::new(),
        }
    }

    /// Collect just the draw events, in order.
    pub fn events(self) -> Result<Vec<DrawEvent>> {
        let mut events = Vec::new();
        for line in self {
            if let TraceLine::Pixel { event, .. } = line? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(Error::from(e))),
            }
            self.line_no += 1;
            match parse_line(&self.buf, self.line_no, self.expand) {
                Ok(Some(line)) => return Some(Ok(line)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
