#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Lineage Emitter
//!
//! Turns the lifecycle of a data pipeline execution into correlated lineage
//! events.
//!
//! This crate provides:
//! - [`LineageController`] -- receives pipeline/task callbacks and emits events
//! - [`CorrelationTable`] -- tracks in-flight tasks from start to end
//! - [`EventSink`] trait -- the outbound delivery seam
//! - [`RecordingSink`], [`BroadcastSink`], [`JsonLinesSink`], [`NoopSink`] -- local sinks
//! - [`EmitterConfig`] -- namespace, producer and granularity settings
//!
//! Delivery to a remote collector is the sink's concern. The controller does
//! not retry, buffer or swallow failures: every error reaches the caller of
//! the callback that triggered it.

pub mod config;
pub mod controller;
pub mod correlation;
pub mod error;
pub mod sink;
pub mod status;
pub mod transition;

pub use config::{EmitterConfig, Granularity};
pub use controller::LineageController;
pub use correlation::{CorrelationTable, RunIdentity, TaskIdentity};
pub use error::{LineageError, Result};
pub use sink::{
    BroadcastSink, EventSink, EventSubscriber, JsonLinesSink, NoopSink, RecordingSink, SinkError,
};
pub use status::RunStatus;
