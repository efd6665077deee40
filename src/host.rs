//! Handoff between the host computation engine and the tick loop.
//!
//! The host runs at its own pace, usually on another thread. Draw events cross
//! over through a bounded channel: the sender never blocks (a full channel
//! drops the event, like a busy worker drops a frame), and the tick loop pulls
//! at most one whole event per tick. Because each [`DrawEvent`] moves through
//! the channel as a single value, the tick loop can never observe a record
//! with fields from two different events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;

use crate::types::DrawEvent;

/// Create a bounded draw-event channel.
pub fn draw_channel(capacity: usize) -> (DrawEventSender, DrawEventReceiver) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    let dropped = Arc::new(AtomicU64::new(0));
    (
        DrawEventSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        DrawEventReceiver { rx, dropped },
    )
}

/// Host-side handle. Cheap to clone and safe to move to another thread.
#[derive(Clone)]
pub struct DrawEventSender {
    tx: SyncSender<DrawEvent>,
    dropped: Arc<AtomicU64>,
}

impl DrawEventSender {
    /// Offer an event without blocking.
    ///
    /// Returns `false` if the event was dropped because the channel is full or
    /// the engine side has gone away.
    pub fn try_send(&self, event: DrawEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Engine-side handle, polled once per tick.
pub struct DrawEventReceiver {
    rx: Receiver<DrawEvent>,
    dropped: Arc<AtomicU64>,
}

impl DrawEventReceiver {
    /// Take the next event if one is waiting.
    #[inline]
    pub fn poll(&self) -> Option<DrawEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Events the host offered while the channel was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_poll_empty() {
        let (_tx, rx) = draw_channel(4);
        assert!(rx.poll().is_none());
    }

    #[test]
    fn test_full_channel_drops() {
        let (tx, rx) = draw_channel(2);
        assert!(tx.try_send(DrawEvent::new(1, 1, 0, false)));
        assert!(tx.try_send(DrawEvent::new(2, 2, 0, false)));
        assert!(!tx.try_send(DrawEvent::new(3, 3, 0, false)));
        assert_eq!(rx.dropped(), 1);
        assert_eq!(rx.poll().map(|e| e.x), Some(1));
        assert_eq!(rx.poll().map(|e| e.x), Some(2));
        assert!(rx.poll().is_none());
    }

    #[test]
    fn test_events_arrive_whole_across_threads() {
        let (tx, rx) = draw_channel(1024);
        let producer = thread::spawn(move || {
            for i in 0..500u16 {
                // x and y always agree, so a torn record would be detectable.
                tx.try_send(DrawEvent::new(i, i, (i % 8) as u8, i % 2 == 0));
            }
        });
        producer.join().unwrap();

        let mut seen = 0;
        while let Some(event) = rx.poll() {
            assert_eq!(event.x, event.y);
            assert_eq!(event.brightness.level() as u16, event.x % 8);
            assert_eq!(event.expand, event.x % 2 == 0);
            seen += 1;
        }
        assert_eq!(seen, 500);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx) = draw_channel(1);
        drop(rx);
        assert!(!tx.try_send(DrawEvent::new(0, 0, 0, false)));
    }
}
