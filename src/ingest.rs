//! Ingest queue between the host computation engine and the persistence ring.
//!
//! The host produces draw events at its own pace; the ring consumes at most one
//! record per tick. This fixed-capacity FIFO absorbs the difference. A single
//! event may expand into a five-point plus-shaped cluster, and such a burst is
//! always accepted or rejected as a whole.

use crate::types::{Brightness, IngestRecord, OverflowPolicy, COORD_MASK};

/// Maximum number of records held at once.
pub const QUEUE_CAPACITY: usize = 64;

/// Largest burst a single event can produce.
pub const MAX_BURST: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    record: IngestRecord,
    /// First record of the burst it was enqueued with.
    burst_start: bool,
}

/// Fixed-capacity FIFO of pending ingest records.
#[derive(Debug, Clone)]
pub struct IngestQueue {
    slots: [Slot; QUEUE_CAPACITY],
    head: usize,
    len: usize,
    policy: OverflowPolicy,
    dropped: u64,
}

impl IngestQueue {
    /// An empty queue using `policy` when a burst does not fit.
    pub fn new(policy: OverflowPolicy) -> Self {
        Self {
            slots: [Slot::default(); QUEUE_CAPACITY],
            head: 0,
            len: 0,
            policy,
            dropped: 0,
        }
    }

    /// Queue one draw request.
    ///
    /// With `expand` set and any brightness other than the minimum, five
    /// records are pushed: the point itself followed by its lower, right,
    /// upper and left neighbours. Coordinates wrap at the 10-bit boundary.
    ///
    /// Returns the number of records accepted (0 if the burst was dropped).
    pub fn enqueue(&mut self, x: u16, y: u16, brightness: Brightness, expand: bool) -> usize {
        let mut burst = [IngestRecord::default(); MAX_BURST];
        let count = expand_burst(x, y, brightness, expand, &mut burst);

        if QUEUE_CAPACITY - self.len < count {
            match self.policy {
                OverflowPolicy::DropNewest => {
                    self.dropped += count as u64;
                    log::trace!("ingest full, dropping {} new record(s) at ({}, {})", count, x, y);
                    return 0;
                }
                OverflowPolicy::DropOldest => {
                    while QUEUE_CAPACITY - self.len < count {
                        let evicted = self.evict_oldest_burst();
                        self.dropped += evicted as u64;
                        log::trace!("ingest full, evicted {} oldest record(s)", evicted);
                    }
                }
            }
        }

        for (i, record) in burst[..count].iter().enumerate() {
            let idx = (self.head + self.len) % QUEUE_CAPACITY;
            self.slots[idx] = Slot {
                record: *record,
                burst_start: i == 0,
            };
            self.len += 1;
        }
        count
    }

    /// Returns the next record without removing it.
    #[inline]
    pub fn peek(&self) -> Option<&IngestRecord> {
        if self.len == 0 {
            None
        } else {
            Some(&self.slots[self.head].record)
        }
    }

    /// Removes the next record. Does nothing when empty.
    #[inline]
    pub fn advance(&mut self) {
        if self.len > 0 {
            self.head = (self.head + 1) % QUEUE_CAPACITY;
            self.len -= 1;
        }
    }

    /// Records currently queued.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free record slots.
    pub fn available(&self) -> usize {
        QUEUE_CAPACITY - self.len
    }

    /// Total records discarded by overflow since construction or the last clear.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Empties the queue and resets the drop counter.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.dropped = 0;
    }

    /// Removes the oldest burst, including any tail records of a burst that
    /// was already partly consumed. Returns the number of records removed.
    fn evict_oldest_burst(&mut self) -> usize {
        let mut evicted = 0;
        while self.len > 0 {
            if evicted > 0 && self.slots[self.head].burst_start {
                break;
            }
            self.advance();
            evicted += 1;
        }
        evicted
    }
}

impl Default for IngestQueue {
    fn default() -> Self {
        Self::new(OverflowPolicy::default())
    }
}

/// Fill `out` with the records for one draw request; returns how many.
fn expand_burst(
    x: u16,
    y: u16,
    brightness: Brightness,
    expand: bool,
    out: &mut [IngestRecord; MAX_BURST],
) -> usize {
    let x = x & COORD_MASK;
    let y = y & COORD_MASK;
    let up = |v: u16| v.wrapping_add(1) & COORD_MASK;
    let down = |v: u16| v.wrapping_sub(1) & COORD_MASK;

    out[0] = IngestRecord::new(x, y, brightness);
    if !expand || brightness.is_min() {
        return 1;
    }
    out[1] = IngestRecord::new(x, up(y), brightness);
    out[2] = IngestRecord::new(up(x), y, brightness);
    out[3] = IngestRecord::new(x, down(y), brightness);
    out[4] = IngestRecord::new(down(x), y, brightness);
    MAX_BURST
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(queue: &mut IngestQueue) -> Vec<(u16, u16)> {
        let mut out = Vec::new();
        while let Some(r) = queue.peek().copied() {
            out.push((r.x, r.y));
            queue.advance();
        }
        out
    }

    #[test]
    fn test_min_brightness_never_expands() {
        let mut queue = IngestQueue::default();
        assert_eq!(queue.enqueue(10, 20, Brightness::MIN, true), 1);
        assert_eq!(coords(&mut queue), vec![(10, 20)]);
    }

    #[test]
    fn test_expansion_plus_shape_order() {
        let mut queue = IngestQueue::default();
        assert_eq!(queue.enqueue(10, 20, Brightness::new(3), true), 5);
        assert_eq!(
            coords(&mut queue),
            vec![(10, 20), (10, 21), (11, 20), (10, 19), (9, 20)]
        );
    }

    #[test]
    fn test_no_expand_flag_pushes_single() {
        let mut queue = IngestQueue::default();
        assert_eq!(queue.enqueue(1, 1, Brightness::MAX, false), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_expansion_wraps_coordinates() {
        let mut queue = IngestQueue::default();
        queue.enqueue(0, 1023, Brightness::new(0), true);
        assert_eq!(
            coords(&mut queue),
            vec![(0, 1023), (0, 0), (1, 1023), (0, 1022), (1023, 1023)]
        );
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut queue = IngestQueue::default();
        assert!(queue.peek().is_none());
        queue.enqueue(5, 6, Brightness::MIN, false);
        assert_eq!(queue.peek().map(|r| (r.x, r.y)), Some((5, 6)));
        assert_eq!(queue.peek().map(|r| (r.x, r.y)), Some((5, 6)));
        queue.advance();
        assert!(queue.is_empty());
        // Advancing an empty queue is harmless.
        queue.advance();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drop_oldest_evicts_whole_burst() {
        let mut queue = IngestQueue::new(OverflowPolicy::DropOldest);
        // 12 bursts of 5 = 60 records, then 4 singles = 64 (full).
        for i in 0..12 {
            queue.enqueue(i * 10, 0, Brightness::new(0), true);
        }
        for i in 0..4 {
            queue.enqueue(500 + i, 0, Brightness::MIN, false);
        }
        assert_eq!(queue.available(), 0);

        queue.enqueue(900, 900, Brightness::MIN, false);
        assert_eq!(queue.dropped(), 5);
        assert_eq!(queue.len(), 60);
        // The first burst (x = 0) is gone; the second burst now leads.
        assert_eq!(queue.peek().map(|r| r.x), Some(10));
    }

    #[test]
    fn test_drop_oldest_discards_partial_burst_tail() {
        let mut queue = IngestQueue::new(OverflowPolicy::DropOldest);
        for i in 0..12 {
            queue.enqueue(i * 10, 0, Brightness::new(0), true);
        }
        for i in 0..4 {
            queue.enqueue(500 + i, 0, Brightness::MIN, false);
        }
        // Consume two records of the first burst; three of its tail remain.
        queue.advance();
        queue.advance();

        queue.enqueue(700, 700, Brightness::new(1), true);
        queue.enqueue(800, 800, Brightness::new(1), true);
        // The tail (3) and then the second burst (5) were evicted.
        assert_eq!(queue.dropped(), 8);
        assert_eq!(queue.peek().map(|r| r.x), Some(20));
        assert_eq!(queue.len(), QUEUE_CAPACITY);
    }

    #[test]
    fn test_drop_newest_keeps_queue() {
        let mut queue = IngestQueue::new(OverflowPolicy::DropNewest);
        for i in 0..QUEUE_CAPACITY as u16 {
            queue.enqueue(i, 0, Brightness::MIN, false);
        }
        assert_eq!(queue.enqueue(999, 0, Brightness::MIN, false), 0);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.peek().map(|r| r.x), Some(0));
    }

    #[test]
    fn test_burst_never_partially_enqueued() {
        let mut queue = IngestQueue::new(OverflowPolicy::DropNewest);
        for i in 0..(QUEUE_CAPACITY - 3) as u16 {
            queue.enqueue(i, 0, Brightness::MIN, false);
        }
        assert_eq!(queue.enqueue(100, 100, Brightness::new(2), true), 0);
        assert_eq!(queue.len(), QUEUE_CAPACITY - 3);
        assert_eq!(queue.dropped(), 5);
    }
}
