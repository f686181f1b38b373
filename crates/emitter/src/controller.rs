//! Lifecycle controller -- the event-correlation core.
//!
//! Receives pipeline and task lifecycle callbacks from the host engine,
//! assigns run identities, and emits one lineage event per transition.

use std::sync::Arc;

use lineage_core::{EntityMapper, EventBuilder, EventKind, LineageEvent, RunId, new_run_id};
use parking_lot::Mutex;

use crate::config::{EmitterConfig, Granularity};
use crate::correlation::{CorrelationTable, RunIdentity};
use crate::error::{LineageError, Result};
use crate::sink::EventSink;
use crate::status::RunStatus;
use crate::transition::validate_transition;

/// State of the pipeline run currently tracked by a controller.
#[derive(Debug)]
struct PipelineRun {
    status: RunStatus,
    identity: Option<RunIdentity>,
}

/// Translates lifecycle callbacks into correlated lineage events.
///
/// Every callback is synchronous: it returns once the event has been handed
/// to the sink, or with the error that prevented it. Callbacks take `&self`,
/// so a controller behind an `Arc` can be driven from parallel workers.
///
/// The sink is always called with no internal lock held.
///
/// # Flow
///
/// 1. `on_pipeline_run_start` -- `START` under a new pipeline run
/// 2. `on_task_start` -- `RUNNING` with inputs under a new task run
/// 3. `on_task_end` -- `COMPLETE` with outputs under that same task run
/// 4. `on_pipeline_run_end` / `on_pipeline_run_error` -- `COMPLETE` / `FAIL`
///    under the pipeline run
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lineage_core::EventKind;
/// use lineage_emitter::{LineageController, RecordingSink};
///
/// let sink = Arc::new(RecordingSink::new());
/// let controller = LineageController::with_defaults(sink.clone());
///
/// controller.on_pipeline_run_start("daily").unwrap();
/// controller.on_task_start("load_data", ["raw"]).unwrap();
/// controller.on_task_end("load_data", ["clean"]).unwrap();
/// controller.on_pipeline_run_end().unwrap();
///
/// let kinds: Vec<EventKind> = sink.events().iter().map(|e| e.kind()).collect();
/// assert_eq!(
///     kinds,
///     [EventKind::Start, EventKind::Running, EventKind::Complete, EventKind::Complete]
/// );
/// ```
pub struct LineageController {
    config: EmitterConfig,
    mapper: EntityMapper,
    builder: EventBuilder,
    tasks: CorrelationTable,
    run: Mutex<PipelineRun>,
    sink: Arc<dyn EventSink>,
}

impl LineageController {
    /// Create a controller from a validated configuration.
    pub fn new(config: EmitterConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, sink))
    }

    /// Create a controller with the default configuration.
    #[must_use]
    pub fn with_defaults(sink: Arc<dyn EventSink>) -> Self {
        Self::assemble(EmitterConfig::default(), sink)
    }

    fn assemble(config: EmitterConfig, sink: Arc<dyn EventSink>) -> Self {
        let mapper = EntityMapper::new(config.namespace.clone());
        Self {
            builder: EventBuilder::new(config.producer.clone()),
            tasks: CorrelationTable::new(mapper.clone()),
            mapper,
            run: Mutex::new(PipelineRun {
                status: RunStatus::Idle,
                identity: None,
            }),
            sink,
            config,
        }
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Status of the tracked pipeline run.
    pub fn status(&self) -> RunStatus {
        self.run.lock().status
    }

    /// Identity of the current (or most recent) pipeline run.
    pub fn current_run(&self) -> Option<RunIdentity> {
        self.run.lock().identity.clone()
    }

    /// Names of tasks that started and have not ended, sorted.
    pub fn in_flight_tasks(&self) -> Vec<String> {
        self.tasks.in_flight()
    }

    /// A pipeline execution is beginning.
    ///
    /// Mints the pipeline run identity and emits `START`. Returns the new
    /// run id. Fails with [`LineageError::InvalidTransition`] if a run is
    /// already in progress.
    ///
    /// Tasks still in flight from an earlier run are released without an
    /// event; their late ends fail with [`LineageError::UnknownTask`].
    pub fn on_pipeline_run_start(&self, pipeline_name: &str) -> Result<RunId> {
        let identity = RunIdentity {
            run_id: new_run_id(),
            job: self.mapper.job_for(pipeline_name),
        };

        let stale = {
            let mut run = self.run.lock();
            validate_transition(run.status, RunStatus::Running)?;
            run.status = RunStatus::Running;
            run.identity = Some(identity.clone());
            // Released before the new run is observable to task callbacks.
            self.tasks.release_stale(identity.run_id)
        };

        if !stale.is_empty() {
            let tasks: Vec<&str> = stale.iter().map(|(name, _)| name.as_str()).collect();
            tracing::warn!(
                run_id = %identity.run_id,
                tasks = ?tasks,
                "released tasks left in flight by an earlier pipeline run"
            );
        }

        tracing::info!(
            pipeline = pipeline_name,
            run_id = %identity.run_id,
            "pipeline run started"
        );

        let run_id = identity.run_id;
        self.emit(self.builder.bare(EventKind::Start, run_id, identity.job))?;
        Ok(run_id)
    }

    /// A task is about to execute with the given input datasets.
    ///
    /// The task is registered in the correlation table before emission; if
    /// the sink fails the entry stays so the matching end can release it.
    pub fn on_task_start<I, S>(&self, task: &str, inputs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pipeline = match (self.config.granularity, self.active_run()) {
            (Granularity::Pipeline, Err(err)) => return Err(err),
            (_, run) => run.ok(),
        };

        let task_run = self
            .tasks
            .begin(task, pipeline.as_ref().map(|run| run.run_id))?;
        let (run_id, job) = match (self.config.granularity, pipeline) {
            (Granularity::Pipeline, Some(run)) => (run.run_id, run.job),
            _ => (task_run.run_id, task_run.job),
        };
        let inputs = self.mapper.datasets_for(inputs);

        tracing::debug!(task, %run_id, inputs = inputs.len(), "task started");

        self.emit(self.builder.build(EventKind::Running, run_id, job, inputs, Vec::new()))
    }

    /// A task finished successfully with the given output datasets.
    ///
    /// Fails with [`LineageError::UnknownTask`] if the task never started.
    /// If the pipeline run has already failed, or the task belongs to an
    /// earlier pipeline run, the task is released and no event is emitted.
    pub fn on_task_end<I, S>(&self, task: &str, outputs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let task_run = self.tasks.end(task)?;

        let (status, pipeline) = {
            let run = self.run.lock();
            (run.status, run.identity.clone())
        };

        let current_run = pipeline.as_ref().map(|run| run.run_id);
        let outlived_owner = task_run
            .pipeline_run
            .is_some_and(|owner| Some(owner) != current_run);

        if status == RunStatus::Failed || outlived_owner {
            tracing::warn!(
                task,
                run_id = %task_run.run_id,
                pipeline_run = ?task_run.pipeline_run,
                "task ended after its pipeline run finished; completion not emitted"
            );
            return Ok(());
        }

        let outputs = self.mapper.datasets_for(outputs);
        tracing::debug!(task, run_id = %task_run.run_id, outputs = outputs.len(), "task completed");

        let event = match self.config.granularity {
            Granularity::Task => self.builder.build(
                EventKind::Complete,
                task_run.run_id,
                task_run.job,
                Vec::new(),
                outputs,
            ),
            Granularity::Pipeline => {
                let identity = match pipeline {
                    Some(identity) if status.is_active() => identity,
                    _ => return Err(LineageError::NoActiveRun),
                };
                self.builder.build(
                    EventKind::Running,
                    identity.run_id,
                    identity.job,
                    Vec::new(),
                    outputs,
                )
            }
        };

        self.emit(event)
    }

    /// The whole pipeline finished successfully; emits `COMPLETE`.
    pub fn on_pipeline_run_end(&self) -> Result<()> {
        let identity = self.finish(RunStatus::Completed)?;
        tracing::info!(run_id = %identity.run_id, job = %identity.job, "pipeline run completed");
        self.emit(self.builder.bare(EventKind::Complete, identity.run_id, identity.job))
    }

    /// The pipeline failed; emits `FAIL`.
    ///
    /// Tasks still in flight stay in the correlation table unless
    /// `sweep_on_finish` is set.
    pub fn on_pipeline_run_error(&self, error: &dyn std::error::Error) -> Result<()> {
        let identity = self.finish(RunStatus::Failed)?;
        tracing::warn!(
            run_id = %identity.run_id,
            job = %identity.job,
            error = %error,
            "pipeline run failed"
        );
        self.emit(self.builder.bare(EventKind::Fail, identity.run_id, identity.job))
    }

    /// Identity of the running pipeline, or [`LineageError::NoActiveRun`].
    fn active_run(&self) -> Result<RunIdentity> {
        let run = self.run.lock();
        match (&run.identity, run.status) {
            (Some(identity), RunStatus::Running) => Ok(identity.clone()),
            _ => Err(LineageError::NoActiveRun),
        }
    }

    /// Move the pipeline run to a terminal status and settle in-flight tasks.
    fn finish(&self, to: RunStatus) -> Result<RunIdentity> {
        let identity = {
            let mut run = self.run.lock();
            validate_transition(run.status, to)?;
            let identity = run.identity.clone().ok_or(LineageError::NoActiveRun)?;
            run.status = to;
            identity
        };

        let orphaned = self.tasks.in_flight();
        if !orphaned.is_empty() {
            tracing::warn!(
                run_id = %identity.run_id,
                status = %to,
                tasks = ?orphaned,
                "pipeline run finished with tasks still in flight"
            );
            if self.config.sweep_on_finish {
                let released = self.tasks.drain();
                tracing::debug!(released = released.len(), "released in-flight tasks");
            }
        }

        Ok(identity)
    }

    fn emit(&self, event: LineageEvent) -> Result<()> {
        tracing::debug!(
            kind = %event.kind(),
            run_id = %event.run_id(),
            job = %event.job(),
            "emitting lineage event"
        );
        self.sink
            .emit(&event)
            .map_err(|source| LineageError::Emission {
                kind: event.kind(),
                run_id: event.run_id(),
                source,
            })
    }
}

impl std::fmt::Debug for LineageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineageController")
            .field("config", &self.config)
            .field("status", &self.status())
            .field("in_flight", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use lineage_core::DEFAULT_PRODUCER;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sink::RecordingSink;

    fn controller(config: EmitterConfig) -> (LineageController, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let controller = LineageController::new(config, sink.clone()).unwrap();
        (controller, sink)
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = EmitterConfig {
            producer: String::new(),
            ..EmitterConfig::default()
        };
        let err = LineageController::new(config, Arc::new(RecordingSink::new())).unwrap_err();
        assert!(matches!(err, LineageError::Config(_)));
    }

    #[test]
    fn start_retains_pipeline_identity() {
        let (controller, sink) = controller(EmitterConfig::default());
        let run_id = controller.on_pipeline_run_start("daily").unwrap();

        let current = controller.current_run().unwrap();
        assert_eq!(current.run_id, run_id);
        assert_eq!(current.job.name, "daily");
        assert_eq!(controller.status(), RunStatus::Running);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::Start);
        assert_eq!(events[0].run_id(), run_id);
        assert_eq!(events[0].producer(), DEFAULT_PRODUCER);
    }

    #[test]
    fn second_start_while_running_is_rejected() {
        let (controller, sink) = controller(EmitterConfig::default());
        let first = controller.on_pipeline_run_start("daily").unwrap();

        let err = controller.on_pipeline_run_start("daily").unwrap_err();
        assert!(matches!(err, LineageError::InvalidTransition { .. }));
        assert_eq!(controller.current_run().unwrap().run_id, first);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn end_without_start_is_rejected() {
        let (controller, sink) = controller(EmitterConfig::default());
        assert!(matches!(
            controller.on_pipeline_run_end(),
            Err(LineageError::InvalidTransition {
                from: RunStatus::Idle,
                to: RunStatus::Completed,
            })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn sequential_runs_get_fresh_identities() {
        let (controller, _sink) = controller(EmitterConfig::default());
        let first = controller.on_pipeline_run_start("daily").unwrap();
        controller.on_pipeline_run_end().unwrap();
        let second = controller.on_pipeline_run_start("daily").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn task_events_use_task_identity() {
        let (controller, sink) = controller(EmitterConfig::default());
        let pipeline_run = controller.on_pipeline_run_start("daily").unwrap();
        controller.on_task_start("load_data", ["raw"]).unwrap();
        controller.on_task_end("load_data", ["clean"]).unwrap();

        let events = sink.events();
        assert_eq!(events[1].job().name, "load_data");
        assert_ne!(events[1].run_id(), pipeline_run);
        assert_eq!(events[1].run_id(), events[2].run_id());
        assert_eq!(events[2].kind(), EventKind::Complete);
        assert_eq!(events[2].outputs()[0].name, "clean");
        assert!(events[2].inputs().is_empty());
    }

    #[test]
    fn task_callbacks_do_not_need_a_pipeline_run_in_task_mode() {
        let (controller, sink) = controller(EmitterConfig::default());
        controller.on_task_start("adhoc", ["raw"]).unwrap();
        controller.on_task_end("adhoc", Vec::<String>::new()).unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn pipeline_granularity_reports_tasks_under_pipeline_run() {
        let (controller, sink) = controller(EmitterConfig {
            granularity: Granularity::Pipeline,
            ..EmitterConfig::default()
        });
        let run_id = controller.on_pipeline_run_start("daily").unwrap();
        controller.on_task_start("load_data", ["raw"]).unwrap();
        controller.on_task_end("load_data", ["clean"]).unwrap();
        controller.on_pipeline_run_end().unwrap();

        let events = sink.events();
        let kinds: Vec<EventKind> = events.iter().map(LineageEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Start,
                EventKind::Running,
                EventKind::Running,
                EventKind::Complete,
            ]
        );
        assert!(events.iter().all(|e| e.run_id() == run_id));
        assert!(events.iter().all(|e| e.job().name == "daily"));
        assert_eq!(events[1].inputs()[0].name, "raw");
        assert_eq!(events[2].outputs()[0].name, "clean");
    }

    #[test]
    fn pipeline_granularity_requires_active_run() {
        let (controller, sink) = controller(EmitterConfig {
            granularity: Granularity::Pipeline,
            ..EmitterConfig::default()
        });
        let err = controller.on_task_start("load_data", ["raw"]).unwrap_err();
        assert!(matches!(err, LineageError::NoActiveRun));
        assert!(controller.in_flight_tasks().is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn late_task_end_after_failure_emits_nothing() {
        let (controller, sink) = controller(EmitterConfig::default());
        controller.on_pipeline_run_start("daily").unwrap();
        controller.on_task_start("load_data", ["raw"]).unwrap();
        controller
            .on_pipeline_run_error(&std::io::Error::other("boom"))
            .unwrap();

        controller.on_task_end("load_data", ["clean"]).unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events()[2].kind(), EventKind::Fail);
        assert!(controller.in_flight_tasks().is_empty());
    }

    #[test]
    fn failure_leaves_in_flight_tasks_by_default() {
        let (controller, _sink) = controller(EmitterConfig::default());
        controller.on_pipeline_run_start("daily").unwrap();
        controller.on_task_start("load_data", ["raw"]).unwrap();
        controller
            .on_pipeline_run_error(&std::io::Error::other("boom"))
            .unwrap();

        assert_eq!(controller.status(), RunStatus::Failed);
        assert_eq!(controller.in_flight_tasks(), vec!["load_data"]);
    }

    #[test]
    fn sweep_on_finish_releases_in_flight_tasks() {
        let (controller, sink) = controller(EmitterConfig {
            sweep_on_finish: true,
            ..EmitterConfig::default()
        });
        controller.on_pipeline_run_start("daily").unwrap();
        controller.on_task_start("load_data", ["raw"]).unwrap();
        controller
            .on_pipeline_run_error(&std::io::Error::other("boom"))
            .unwrap();

        assert!(controller.in_flight_tasks().is_empty());
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn debug_hides_sink() {
        let (controller, _sink) = controller(EmitterConfig::default());
        let rendered = format!("{controller:?}");
        assert!(rendered.contains("LineageController"));
        assert!(rendered.contains("Idle"));
    }
}
