//! Correlation of task starts with task ends.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lineage_core::{EntityMapper, JobDescriptor, RunId, new_run_id};

use crate::error::LineageError;

/// The run and job a pipeline run or task run is tracked under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    /// Run identifier minted when the run started.
    pub run_id: RunId,
    /// Job describing the pipeline or task.
    pub job: JobDescriptor,
}

/// A task run, stamped with the pipeline run it started under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskIdentity {
    /// Run identifier minted when the task started.
    pub run_id: RunId,
    /// Job describing the task.
    pub job: JobDescriptor,
    /// Pipeline run that was running when the task started, if any.
    pub pipeline_run: Option<RunId>,
}

/// Thread-safe table of in-flight tasks, keyed by task name.
///
/// A name has at most one live entry. `begin` and `end` on distinct names
/// never contend on the same shard lock for longer than the map operation
/// itself, and no lock is held once they return.
///
/// # Examples
///
/// ```
/// use lineage_core::EntityMapper;
/// use lineage_emitter::correlation::CorrelationTable;
///
/// let table = CorrelationTable::new(EntityMapper::default());
/// let started = table.begin("load_data", None).unwrap();
/// let finished = table.end("load_data").unwrap();
/// assert_eq!(started, finished);
/// assert!(table.end("load_data").is_err());
/// ```
#[derive(Debug)]
pub struct CorrelationTable {
    mapper: EntityMapper,
    entries: DashMap<String, TaskIdentity>,
}

impl CorrelationTable {
    /// Create an empty table that describes tasks with `mapper`.
    #[must_use]
    pub fn new(mapper: EntityMapper) -> Self {
        Self {
            mapper,
            entries: DashMap::new(),
        }
    }

    /// Start tracking a task under a freshly minted identity, owned by
    /// `pipeline_run` when one is running.
    ///
    /// Fails with [`LineageError::DuplicateTask`] if the name is already in
    /// flight; the existing entry is left untouched.
    pub fn begin(
        &self,
        task: &str,
        pipeline_run: Option<RunId>,
    ) -> Result<TaskIdentity, LineageError> {
        match self.entries.entry(task.to_owned()) {
            Entry::Occupied(_) => Err(LineageError::DuplicateTask {
                task: task.to_owned(),
            }),
            Entry::Vacant(slot) => {
                let identity = TaskIdentity {
                    run_id: new_run_id(),
                    job: self.mapper.job_for(task),
                    pipeline_run,
                };
                slot.insert(identity.clone());
                Ok(identity)
            }
        }
    }

    /// Stop tracking a task and hand back the identity it started with.
    ///
    /// Fails with [`LineageError::UnknownTask`] if the name is not in flight.
    pub fn end(&self, task: &str) -> Result<TaskIdentity, LineageError> {
        self.entries
            .remove(task)
            .map(|(_, identity)| identity)
            .ok_or_else(|| LineageError::UnknownTask {
                task: task.to_owned(),
            })
    }

    /// Check whether a task is in flight.
    #[must_use]
    pub fn contains(&self, task: &str) -> bool {
        self.entries.contains_key(task)
    }

    /// Names of all in-flight tasks, sorted.
    #[must_use]
    pub fn in_flight(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Release every in-flight task, returning what was released sorted by name.
    pub fn drain(&self) -> Vec<(String, TaskIdentity)> {
        self.in_flight()
            .into_iter()
            .filter_map(|name| self.entries.remove(&name))
            .collect()
    }

    /// Release tasks owned by a pipeline run other than `current`, sorted by
    /// name. Tasks started outside any pipeline run are kept.
    pub fn release_stale(&self, current: RunId) -> Vec<(String, TaskIdentity)> {
        let is_stale =
            |identity: &TaskIdentity| identity.pipeline_run.is_some_and(|owner| owner != current);

        let mut stale: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| is_stale(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();
        stale.sort();

        stale
            .into_iter()
            .filter_map(|name| self.entries.remove_if(&name, |_, identity| is_stale(identity)))
            .collect()
    }

    /// Number of in-flight tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no task is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new(EntityMapper::default())
    }
}
