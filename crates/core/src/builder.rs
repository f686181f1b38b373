//! Event construction.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::entity::{DatasetDescriptor, JobDescriptor};
use crate::event::{EventKind, LineageEvent};
use crate::id::RunId;

/// Builds [`LineageEvent`]s stamped with the producer and the build time.
///
/// Timestamps come from the wall clock but never go backwards: each stamp is
/// the later of "now" and the previous stamp handed out by this builder.
///
/// # Examples
///
/// ```
/// use lineage_core::{EntityMapper, EventBuilder, EventKind, new_run_id};
///
/// let builder = EventBuilder::new("kedro.org");
/// let job = EntityMapper::default().job_for("daily");
/// let event = builder.bare(EventKind::Start, new_run_id(), job);
/// assert_eq!(event.producer(), "kedro.org");
/// assert!(event.inputs().is_empty());
/// ```
#[derive(Debug)]
pub struct EventBuilder {
    producer: String,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl EventBuilder {
    /// Create a builder for the given producer identity.
    #[must_use]
    pub fn new(producer: impl Into<String>) -> Self {
        Self {
            producer: producer.into(),
            last_stamp: Mutex::new(None),
        }
    }

    /// The producer stamped into every event.
    #[must_use]
    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// Build an event carrying inputs and outputs.
    #[must_use]
    pub fn build(
        &self,
        kind: EventKind,
        run_id: RunId,
        job: JobDescriptor,
        inputs: Vec<DatasetDescriptor>,
        outputs: Vec<DatasetDescriptor>,
    ) -> LineageEvent {
        LineageEvent::new(
            kind,
            self.stamp(),
            run_id,
            job,
            self.producer.clone(),
            inputs,
            outputs,
        )
    }

    /// Build an event with no inputs or outputs.
    #[must_use]
    pub fn bare(&self, kind: EventKind, run_id: RunId, job: JobDescriptor) -> LineageEvent {
        self.build(kind, run_id, job, Vec::new(), Vec::new())
    }

    fn stamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let mut last = self.last_stamp.lock();
        let stamp = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}
