//! Run identifiers.
//!
//! [`RunId`] is a strongly-typed UUID built on
//! [`domain-key`](https://crates.io/crates/domain-key) `Uuid<D>` wrappers.
//! A fresh value is minted every time a pipeline run or a task run begins;
//! values are never derived from caller input and never reused.
//!
//! `RunId` is `Copy` (16 bytes, stack-allocated) and supports:
//! - `v4()` for random UUID generation
//! - `parse(&str)` for string parsing
//! - Full serde support (serializes as UUID string)
//! - `Display`, `FromStr`, `Eq`, `Ord`, `Hash`

use domain_key::define_uuid;

// Re-export for downstream parse error handling
pub use domain_key::UuidParseError;

define_uuid!(pub RunIdDomain => RunId);

/// Generate a new random run identifier.
///
/// Never fails; every call returns a value that has not been handed out
/// before with overwhelming probability.
#[must_use]
pub fn new_run_id() -> RunId {
    RunId::v4()
}
