//! Lineage run events.
//!
//! The serialized shape follows the OpenLineage `RunEvent` document, so a
//! [`LineageEvent`] can be handed to any collector speaking that format.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{DatasetDescriptor, JobDescriptor};
use crate::id::RunId;

/// Fixed identity of this emitter, carried in every event's `producer`.
pub const DEFAULT_PRODUCER: &str = "kedro.org";

/// Schema the serialized events conform to.
pub const SCHEMA_URL: &str = "https://openlineage.io/spec/2-0-2/OpenLineage.json#/$defs/RunEvent";

/// The lifecycle transition an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A run began.
    Start,
    /// A run is in progress; carries intermediate inputs or outputs.
    Running,
    /// A run finished successfully.
    Complete,
    /// A run failed.
    Fail,
}

impl EventKind {
    /// Returns `true` for kinds that close a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Fail)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Running => write!(f, "RUNNING"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Reference to the run an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRef {
    /// The run identifier.
    pub run_id: RunId,
}

/// A timestamped lineage record.
///
/// Built once by [`EventBuilder`](crate::builder::EventBuilder) and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageEvent {
    event_type: EventKind,
    event_time: DateTime<Utc>,
    run: RunRef,
    job: JobDescriptor,
    producer: String,
    #[serde(rename = "schemaURL")]
    schema_url: String,
    #[serde(default)]
    inputs: Vec<DatasetDescriptor>,
    #[serde(default)]
    outputs: Vec<DatasetDescriptor>,
}

impl LineageEvent {
    pub(crate) fn new(
        event_type: EventKind,
        event_time: DateTime<Utc>,
        run_id: RunId,
        job: JobDescriptor,
        producer: String,
        inputs: Vec<DatasetDescriptor>,
        outputs: Vec<DatasetDescriptor>,
    ) -> Self {
        Self {
            event_type,
            event_time,
            run: RunRef { run_id },
            job,
            producer,
            schema_url: SCHEMA_URL.to_owned(),
            inputs,
            outputs,
        }
    }

    /// The transition this event reports.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.event_type
    }

    /// When the event was built.
    #[must_use]
    pub fn event_time(&self) -> DateTime<Utc> {
        self.event_time
    }

    /// The run this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run.run_id
    }

    /// The job this event belongs to.
    #[must_use]
    pub fn job(&self) -> &JobDescriptor {
        &self.job
    }

    /// Identity of the emitting implementation.
    #[must_use]
    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// Schema URL of the serialized document.
    #[must_use]
    pub fn schema_url(&self) -> &str {
        &self.schema_url
    }

    /// Datasets consumed, in engine order.
    #[must_use]
    pub fn inputs(&self) -> &[DatasetDescriptor] {
        &self.inputs
    }

    /// Datasets produced, in engine order.
    #[must_use]
    pub fn outputs(&self) -> &[DatasetDescriptor] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::entity::EntityMapper;

    fn sample() -> LineageEvent {
        let mapper = EntityMapper::default();
        LineageEvent::new(
            EventKind::Running,
            DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            RunId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            mapper.job_for("load_data"),
            DEFAULT_PRODUCER.to_owned(),
            mapper.datasets_for(["raw"]),
            Vec::new(),
        )
    }

    #[rstest]
    #[case(EventKind::Start, "\"START\"")]
    #[case(EventKind::Running, "\"RUNNING\"")]
    #[case(EventKind::Complete, "\"COMPLETE\"")]
    #[case(EventKind::Fail, "\"FAIL\"")]
    fn event_kind_wire_names(#[case] kind: EventKind, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        assert_eq!(format!("\"{kind}\""), expected);
    }

    #[test]
    fn terminal_kinds() {
        assert!(EventKind::Complete.is_terminal());
        assert!(EventKind::Fail.is_terminal());
        assert!(!EventKind::Start.is_terminal());
        assert!(!EventKind::Running.is_terminal());
    }

    #[test]
    fn serializes_as_openlineage_run_event() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["eventType"], "RUNNING");
        assert_eq!(json["eventTime"], "2024-05-01T12:00:00Z");
        assert_eq!(json["run"]["runId"], "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(json["job"]["namespace"], "kedro");
        assert_eq!(json["job"]["name"], "load_data");
        assert_eq!(json["producer"], DEFAULT_PRODUCER);
        assert_eq!(json["schemaURL"], SCHEMA_URL);
        assert_eq!(json["inputs"][0]["name"], "raw");
        assert_eq!(json["outputs"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn missing_io_lists_default_to_empty() {
        let json = r#"{
            "eventType": "START",
            "eventTime": "2024-05-01T12:00:00Z",
            "run": {"runId": "550e8400-e29b-41d4-a716-446655440000"},
            "job": {"namespace": "kedro", "name": "daily"},
            "producer": "kedro.org",
            "schemaURL": "x"
        }"#;
        let event: LineageEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), EventKind::Start);
        assert!(event.inputs().is_empty());
        assert!(event.outputs().is_empty());
    }
}
