//! Lineage entities: jobs and datasets.
//!
//! Pipeline-native names (pipeline name, task name, catalog dataset name)
//! are wrapped with the namespace of the hosting engine. The mapping is
//! total; it never fails and never rewrites the name.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace identifying the hosting pipeline engine.
pub const DEFAULT_NAMESPACE: &str = "kedro";

/// Identifies *what* is running: a pipeline or one task within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Engine namespace.
    pub namespace: String,
    /// Pipeline or task name.
    pub name: String,
}

/// A logical data artifact consumed or produced by a job.
///
/// `name` is the catalog identifier, not the physical storage path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Engine namespace.
    pub namespace: String,
    /// Catalog dataset name.
    pub name: String,
}

impl fmt::Display for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for DatasetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Maps pipeline-native names into namespaced lineage entities.
///
/// # Examples
///
/// ```
/// use lineage_core::entity::EntityMapper;
///
/// let mapper = EntityMapper::default();
/// let job = mapper.job_for("load_data");
/// assert_eq!(job.namespace, "kedro");
/// assert_eq!(job.name, "load_data");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMapper {
    namespace: String,
}

impl EntityMapper {
    /// Create a mapper for the given engine namespace.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// The namespace every descriptor is stamped with.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Describe a pipeline or task as a job.
    #[must_use]
    pub fn job_for(&self, name: &str) -> JobDescriptor {
        JobDescriptor {
            namespace: self.namespace.clone(),
            name: name.to_owned(),
        }
    }

    /// Describe a single catalog dataset.
    #[must_use]
    pub fn dataset_for(&self, name: &str) -> DatasetDescriptor {
        DatasetDescriptor {
            namespace: self.namespace.clone(),
            name: name.to_owned(),
        }
    }

    /// Describe a sequence of datasets.
    ///
    /// Input order is kept and duplicates are not collapsed; uniqueness is
    /// the engine's concern.
    pub fn datasets_for<I, S>(&self, names: I) -> Vec<DatasetDescriptor>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.dataset_for(name.as_ref()))
            .collect()
    }
}

impl Default for EntityMapper {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}
