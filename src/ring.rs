//! Persistence ring: the bounded store of active points.
//!
//! Four segments of [`SEGMENT_LEN`] slots are chained into one logical ring.
//! All segments share a single rotating slot cursor; on every tick the slot
//! under the cursor is the *exit* (oldest entry) of each segment, and it is
//! overwritten with the conditionally decayed exit of the previous segment.
//! A point therefore hops one segment every [`SEGMENT_LEN`] ticks and circles
//! the whole ring until it dies or is replaced.
//!
//! Besides the exit, each segment exposes eight fixed-offset *taps* so the
//! scheduler can tell whether a point is already stored without a full scan.
//! Any stored point is visible either at an exit (O(1)) or at one of the 32
//! taps (O(32)), which bounds the work of every tick.

use crate::ingest::IngestQueue;
use crate::types::{IngestRecord, Point, LUMA_MAX};

/// Number of chained segments.
pub const SEGMENT_COUNT: usize = 4;

/// Slots per segment.
pub const SEGMENT_LEN: usize = 1024;

/// Read taps per segment.
pub const TAPS_PER_SEGMENT: usize = 8;

/// Total tap positions scanned each tick.
pub const TAP_COUNT: usize = SEGMENT_COUNT * TAPS_PER_SEGMENT;

/// Tap offsets relative to the slot cursor.
///
/// Nominal spacing is 128 slots; the first tap sits one slot past the exit
/// rather than at offset 0 since the exit is already compared directly.
pub const TAP_OFFSETS: [usize; TAPS_PER_SEGMENT] = [1, 128, 256, 384, 512, 640, 768, 896];

/// Ticks without any sighting of the pending record before it may be inserted.
pub const SEARCH_TIMEOUT: u16 = 1024;

/// Upper edge (exclusive) of the fast-decay band.
const FAST_DECAY_HIGH: u16 = 3936;
/// Lower edge (exclusive) of the fast-decay band.
const FAST_DECAY_LOW: u16 = 3864;
/// Luma a point drops to when it leaves the bright initial emission.
const AFTERGLOW_LUMA: u16 = 2576;

/// One decay step.
///
/// Luma drops by one, except inside the narrow band just below the initial
/// flash where it falls straight to the afterglow level. The result is a
/// short bright phase followed by a long slow fade.
#[inline]
pub const fn decay(luma: u16) -> u16 {
    if luma > FAST_DECAY_LOW && luma < FAST_DECAY_HIGH {
        AFTERGLOW_LUMA
    } else {
        luma.saturating_sub(1)
    }
}

/// Number of [`decay`] steps until a point of the given luma is dead.
pub fn decay_steps_to_dead(mut luma: u16) -> u32 {
    let mut steps = 0;
    while Point::new(0, 0, luma).is_live() {
        luma = decay(luma);
        steps += 1;
    }
    steps
}

/// What the scheduler did on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingAction {
    /// The pending record was written into a dead slot.
    Inserted { segment: usize, point: Point },
    /// A stored point matching the pending record was re-brightened.
    Refreshed { segment: usize, point: Point },
    /// The pending record was seen at a tap; the search timer restarted.
    Matched,
    /// The pending record was not found anywhere this tick.
    Searching,
    /// Nothing to ingest.
    Idle,
}

/// Four chained segments plus the scheduler state that drives them.
pub struct PersistenceRing {
    segments: Box<[[Point; SEGMENT_LEN]; SEGMENT_COUNT]>,
    /// Slot index shared by all segments; the current exit position.
    cursor: usize,
    /// Ticks since the pending record was last seen.
    search_counter: u16,
    /// Coordinates the search counter belongs to.
    search_key: Option<(u16, u16)>,
}

impl PersistenceRing {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self {
            segments: Box::new([[Point::EMPTY; SEGMENT_LEN]; SEGMENT_COUNT]),
            cursor: 0,
            search_counter: 0,
            search_key: None,
        }
    }

    /// Clears every slot and the scheduler state.
    pub fn reset(&mut self) {
        for segment in self.segments.iter_mut() {
            segment.fill(Point::EMPTY);
        }
        self.cursor = 0;
        self.search_counter = 0;
        self.search_key = None;
    }

    /// The points currently leaving each segment.
    #[inline]
    pub fn exits(&self) -> [Point; SEGMENT_COUNT] {
        std::array::from_fn(|seg| self.segments[seg][self.cursor])
    }

    /// All tap reads in priority order: segment 0 before 1 before 2 before 3,
    /// lowest tap index first within a segment.
    #[inline]
    pub fn taps(&self) -> [Point; TAP_COUNT] {
        std::array::from_fn(|i| {
            let seg = i / TAPS_PER_SEGMENT;
            let offset = TAP_OFFSETS[i % TAPS_PER_SEGMENT];
            self.segments[seg][(self.cursor + offset) % SEGMENT_LEN]
        })
    }

    /// Current exit slot index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current value of the search timer.
    pub fn search_counter(&self) -> u16 {
        self.search_counter
    }

    /// Advance the ring by one tick.
    ///
    /// Every segment's exit is handed to the next segment's head, decayed when
    /// `decay_now` is set and zeroed when dead. On top of that, at most one of
    /// the following happens, checked in order against the next queued record:
    ///
    /// 1. the search timer has run out and some exit is dead: the record is
    ///    inserted at full luma in place of that exit's hand-off;
    /// 2. some live exit has the record's coordinates: it is refreshed to full
    ///    luma on its way into the next segment;
    /// 3. some live tap has the record's coordinates: the search timer restarts;
    /// 4. otherwise the search timer counts up.
    pub fn tick(&mut self, queue: &mut IngestQueue, decay_now: bool) -> RingAction {
        let slot = self.cursor;
        let exits = self.exits();

        // heads[n] is what segment n receives from segment n - 1.
        let mut heads: [Point; SEGMENT_COUNT] = std::array::from_fn(|n| {
            hand_off(exits[(n + SEGMENT_COUNT - 1) % SEGMENT_COUNT], decay_now)
        });

        let action = match queue.peek().copied() {
            None => {
                self.search_key = None;
                self.search_counter = 0;
                RingAction::Idle
            }
            Some(record) => {
                let action = self.schedule(&record, &exits, &mut heads);
                if matches!(
                    action,
                    RingAction::Inserted { .. } | RingAction::Refreshed { .. }
                ) {
                    queue.advance();
                    self.search_key = None;
                }
                action
            }
        };

        for (segment, head) in self.segments.iter_mut().zip(heads) {
            segment[slot] = head;
        }
        self.cursor = (slot + 1) % SEGMENT_LEN;
        action
    }

    fn schedule(
        &mut self,
        record: &IngestRecord,
        exits: &[Point; SEGMENT_COUNT],
        heads: &mut [Point; SEGMENT_COUNT],
    ) -> RingAction {
        let key = (record.x, record.y);
        if self.search_key != Some(key) {
            self.search_key = Some(key);
            self.search_counter = 0;
        }

        if self.search_counter > SEARCH_TIMEOUT {
            if let Some(seg) = exits.iter().position(Point::is_dead) {
                let point = Point::new(record.x, record.y, LUMA_MAX);
                let target = (seg + 1) % SEGMENT_COUNT;
                heads[target] = point;
                self.search_counter = 0;
                log::trace!("insert ({}, {}) into segment {}", point.x, point.y, target);
                return RingAction::Inserted {
                    segment: target,
                    point,
                };
            }
        }

        if let Some(seg) = exits
            .iter()
            .position(|p| p.is_live() && p.is_at(record.x, record.y))
        {
            let point = Point::new(record.x, record.y, LUMA_MAX);
            let target = (seg + 1) % SEGMENT_COUNT;
            heads[target] = point;
            self.search_counter = 0;
            log::trace!("refresh ({}, {}) into segment {}", point.x, point.y, target);
            return RingAction::Refreshed {
                segment: target,
                point,
            };
        }

        if self
            .taps()
            .iter()
            .any(|p| p.is_live() && p.is_at(record.x, record.y))
        {
            self.search_counter = 0;
            return RingAction::Matched;
        }

        self.search_counter = self.search_counter.saturating_add(1);
        RingAction::Searching
    }

    /// Iterate over every slot of every segment.
    pub fn points(&self) -> impl Iterator<Item = &Point> + '_ {
        self.segments.iter().flat_map(|seg| seg.iter())
    }

    /// Number of live points stored. Scans the whole ring; diagnostics only.
    pub fn live_count(&self) -> usize {
        self.points().filter(|p| p.is_live()).count()
    }

    /// Find a live point at the given coordinates. Scans the whole ring.
    pub fn find_live(&self, x: u16, y: u16) -> Option<Point> {
        self.points().copied().find(|p| p.is_live() && p.is_at(x, y))
    }

    /// Number of live points at the given coordinates. Scans the whole ring.
    pub fn live_copies(&self, x: u16, y: u16) -> usize {
        self.points()
            .filter(|p| p.is_live() && p.is_at(x, y))
            .count()
    }
}

impl Default for PersistenceRing {
    fn default() -> Self {
        Self::new()
    }
}

/// The value a segment exit carries into the next segment.
#[inline]
fn hand_off(exit: Point, decay_now: bool) -> Point {
    if exit.is_dead() {
        Point { luma: 0, ..exit }
    } else if decay_now {
        Point {
            luma: decay(exit.luma),
            ..exit
        }
    } else {
        exit
    }
}
