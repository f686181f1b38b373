//! Event sinks.
//!
//! [`EventSink`] is the single outbound seam of the emitter. Delivery to a
//! remote collector (HTTP, Kafka, retries, batching) lives behind this trait
//! in the host; the sinks here are the local ones every embedding needs.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lineage_core::{LineageEvent, RunId};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors a sink reports when it cannot accept an event.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the event failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The event could not be serialized.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The collector refused the event.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The sink has been shut down.
    #[error("sink closed")]
    Closed,
}

/// Receives lineage events from the controller.
///
/// `emit` is called synchronously from the lifecycle callback that produced
/// the event, and at most once per event. Implementations must not retry by
/// calling back into the controller.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError>;
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError> {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError> {
        (**self).emit(event)
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl NoopSink {
    /// Create as an `Arc<dyn EventSink>` for dependency injection.
    #[must_use]
    pub fn arc() -> Arc<dyn EventSink> {
        Arc::new(Self)
    }
}

impl EventSink for NoopSink {
    fn emit(&self, _event: &LineageEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory sink that keeps every event in arrival order.
///
/// # Examples
///
/// ```
/// use lineage_core::{EntityMapper, EventBuilder, EventKind, new_run_id};
/// use lineage_emitter::sink::{EventSink, RecordingSink};
///
/// let sink = RecordingSink::new();
/// let event = EventBuilder::new("kedro.org").bare(
///     EventKind::Start,
///     new_run_id(),
///     EntityMapper::default().job_for("daily"),
/// );
/// sink.emit(&event).unwrap();
/// assert_eq!(sink.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LineageEvent>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event received so far.
    #[must_use]
    pub fn events(&self) -> Vec<LineageEvent> {
        self.events.lock().clone()
    }

    /// Number of events received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Forget every recorded event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Fans events out to in-process subscribers over a bounded channel.
///
/// An event emitted while nobody is subscribed is counted as unobserved, not
/// reported as a failure. A subscriber that falls more than `capacity` events
/// behind skips to the oldest retained event.
pub struct BroadcastSink {
    sender: broadcast::Sender<LineageEvent>,
    emitted: AtomicU64,
    unobserved: AtomicU64,
}

impl BroadcastSink {
    /// Create a sink retaining up to `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            emitted: AtomicU64::new(0),
            unobserved: AtomicU64::new(0),
        }
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
            skipped: 0,
        }
    }

    /// Events handed to this sink since creation.
    #[must_use]
    pub fn total_emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Events emitted while no subscriber was listening.
    #[must_use]
    pub fn unobserved(&self) -> u64 {
        self.unobserved.load(Ordering::Relaxed)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError> {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        if self.sender.send(event.clone()).is_err() {
            self.unobserved.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                kind = %event.kind(),
                run_id = %event.run_id(),
                "no lineage subscribers"
            );
        }
        Ok(())
    }
}

/// Receiving end of a [`BroadcastSink`].
pub struct EventSubscriber {
    receiver: broadcast::Receiver<LineageEvent>,
    skipped: u64,
}

impl EventSubscriber {
    /// Wait for the next event.
    ///
    /// Returns `None` once the sink has been dropped and drained.
    pub async fn recv(&mut self) -> Option<LineageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => self.note_lag(missed),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<LineageEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => self.note_lag(missed),
                Err(_) => return None,
            }
        }
    }

    /// Collect the events of `run_id` until it reaches `COMPLETE` or `FAIL`.
    ///
    /// Events of other runs are skipped. The returned events are in arrival
    /// order and end with the terminal one. Returns `None` if the sink closes
    /// before the run finishes.
    pub async fn run_outcome(&mut self, run_id: RunId) -> Option<Vec<LineageEvent>> {
        let mut events = Vec::new();
        while let Some(event) = self.recv().await {
            if event.run_id() != run_id {
                continue;
            }
            let terminal = event.kind().is_terminal();
            events.push(event);
            if terminal {
                return Some(events);
            }
        }
        None
    }

    /// Events this subscriber missed by falling behind.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn note_lag(&mut self, missed: u64) {
        self.skipped += missed;
        tracing::warn!(missed, total = self.skipped, "lineage subscriber lagged");
    }
}

/// Writes each event as one JSON document per line.
///
/// The writer is flushed after every event so a crashed host loses at most
/// the event being written.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError> {
        let line = serde_json::to_vec(event)?;
        let mut writer = self.writer.lock();
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
