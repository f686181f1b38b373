#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Lineage Core
//!
//! Identities, entities and the event model shared by every lineage crate.
//!
//! ## Key Components
//!
//! - **Identifiers**: [`RunId`], one per pipeline run or task run
//! - **Entities**: [`JobDescriptor`], [`DatasetDescriptor`] and the [`EntityMapper`]
//!   that namespaces pipeline-native names
//! - **Events**: [`LineageEvent`] and [`EventKind`], serialized as OpenLineage run events
//! - **Construction**: [`EventBuilder`], which stamps producer and a non-decreasing time
//!
//! ## Usage
//!
//! ```rust
//! use lineage_core::{EntityMapper, EventBuilder, EventKind, new_run_id};
//!
//! let mapper = EntityMapper::default();
//! let builder = EventBuilder::new("kedro.org");
//!
//! let event = builder.build(
//!     EventKind::Running,
//!     new_run_id(),
//!     mapper.job_for("load_data"),
//!     mapper.datasets_for(["raw"]),
//!     Vec::new(),
//! );
//! assert_eq!(event.inputs()[0].name, "raw");
//! ```

pub mod builder;
pub mod entity;
pub mod event;
pub mod id;

pub use builder::EventBuilder;
pub use entity::{DEFAULT_NAMESPACE, DatasetDescriptor, EntityMapper, JobDescriptor};
pub use event::{DEFAULT_PRODUCER, EventKind, LineageEvent, RunRef, SCHEMA_URL};
pub use id::{RunId, UuidParseError, new_run_id};
