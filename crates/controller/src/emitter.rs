//! Event emitter
//!
//! Publishes committed mutations onto a bounded channel without ever
//! blocking the publisher, which still holds the topology write lock.
//! Overflowing events are dropped and counted; the subscriber can read the
//! counter and resync from a full snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::event::Event;

/// Default event channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Single-subscriber, non-blocking event publisher
pub struct EventEmitter {
    sender: mpsc::Sender<Event>,
    /// Receiver waiting to be taken by the subscriber
    receiver: Mutex<Option<mpsc::Receiver<Event>>>,
    dropped: Arc<AtomicU64>,
    capacity: usize,
}

impl EventEmitter {
    /// Create an emitter with the given channel capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            dropped: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Publish an event; never waits
    ///
    /// Returns `false` if the event was dropped.
    pub fn emit(&self, event: Event) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "Event channel full (capacity {}), dropped {} (total dropped {})",
                    self.capacity, event, dropped
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Event subscriber gone, dropped {}", event);
                false
            }
        }
    }

    /// Take the event stream
    ///
    /// Only one subscriber is supported; later calls return `None`.
    /// Events published before subscription are buffered up to capacity.
    pub fn subscribe(&self) -> Option<EventStream> {
        let receiver = self.receiver.lock().take()?;
        Some(EventStream {
            receiver,
            dropped: self.dropped.clone(),
        })
    }

    /// Total number of events dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Receiving half of the event channel, in commit order
pub struct EventStream {
    receiver: mpsc::Receiver<Event>,
    dropped: Arc<AtomicU64>,
}

impl EventStream {
    /// Wait for the next event; `None` once the emitter is gone
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Events lost to overflow since the emitter was created
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Command;

    fn shard_event(index: usize) -> Event {
        Event::shard("ns", "c", index, Command::Create, index as u64 + 1)
    }

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let emitter = EventEmitter::new(8);
        let mut stream = emitter.subscribe().unwrap();

        for i in 0..3 {
            assert!(emitter.emit(shard_event(i)));
        }

        for i in 0..3 {
            let event = stream.recv().await.unwrap();
            assert_eq!(event.shard, i as i32);
        }
        assert_eq!(stream.dropped(), 0);
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let emitter = EventEmitter::new(2);

        assert!(emitter.emit(shard_event(0)));
        assert!(emitter.emit(shard_event(1)));
        assert!(!emitter.emit(shard_event(2)));
        assert_eq!(emitter.dropped(), 1);

        let mut stream = emitter.subscribe().unwrap();
        let events = stream.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(stream.dropped(), 1);

        assert!(emitter.emit(shard_event(3)));
        assert_eq!(stream.try_recv().map(|e| e.shard), Some(3));
    }

    #[test]
    fn test_single_subscriber() {
        let emitter = EventEmitter::default();
        assert!(emitter.subscribe().is_some());
        assert!(emitter.subscribe().is_none());
    }

    #[test]
    fn test_closed_subscriber_counts_as_dropped() {
        let emitter = EventEmitter::new(4);
        drop(emitter.subscribe());

        assert!(!emitter.emit(shard_event(0)));
        assert_eq!(emitter.dropped(), 1);
    }
}
