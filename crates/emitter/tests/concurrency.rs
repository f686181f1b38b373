//! Parallel task callbacks against a shared controller.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lineage_core::{EventKind, LineageEvent, RunId};
use lineage_emitter::{EventSink, LineageController, RecordingSink, SinkError};

#[test]
fn parallel_tasks_keep_their_own_identity() {
    let sink = Arc::new(RecordingSink::new());
    let controller = Arc::new(LineageController::with_defaults(sink.clone()));
    controller.on_pipeline_run_start("fan_out").unwrap();

    thread::scope(|scope| {
        for worker in 0..8 {
            let controller = Arc::clone(&controller);
            scope.spawn(move || {
                for round in 0..25 {
                    let task = format!("task_{worker}_{round}");
                    controller
                        .on_task_start(&task, [format!("in_{worker}_{round}")])
                        .unwrap();
                    controller
                        .on_task_end(&task, [format!("out_{worker}_{round}")])
                        .unwrap();
                }
            });
        }
    });

    controller.on_pipeline_run_end().unwrap();
    assert!(controller.in_flight_tasks().is_empty());

    let events = sink.events();
    assert_eq!(events.len(), 2 + 8 * 25 * 2);

    let mut runs_by_task: HashMap<String, Vec<(EventKind, RunId)>> = HashMap::new();
    for event in events.iter().filter(|e| e.job().name.starts_with("task_")) {
        runs_by_task
            .entry(event.job().name.clone())
            .or_default()
            .push((event.kind(), event.run_id()));
    }

    assert_eq!(runs_by_task.len(), 200);
    let mut seen_runs = std::collections::HashSet::new();
    for (task, runs) in &runs_by_task {
        assert_eq!(runs.len(), 2, "task {task}");
        assert_eq!(runs[0].0, EventKind::Running);
        assert_eq!(runs[1].0, EventKind::Complete);
        assert_eq!(runs[0].1, runs[1].1, "task {task} changed run id");
        assert!(seen_runs.insert(runs[0].1), "run id shared across tasks");
    }
}

#[test]
fn same_task_name_from_two_workers_is_rejected_once() {
    let sink = Arc::new(RecordingSink::new());
    let controller = Arc::new(LineageController::with_defaults(sink.clone()));

    let outcomes: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let controller = Arc::clone(&controller);
                scope.spawn(move || controller.on_task_start("shared", ["raw"]).is_ok())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(controller.in_flight_tasks(), vec!["shared"]);
    assert_eq!(sink.len(), 1);
}

/// Sink that parks the caller on events for one job until released.
struct GateSink {
    gated_job: &'static str,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    delivered: RecordingSink,
}

impl EventSink for GateSink {
    fn emit(&self, event: &LineageEvent) -> Result<(), SinkError> {
        if event.job().name == self.gated_job {
            self.entered
                .lock()
                .unwrap()
                .send(())
                .map_err(|_| SinkError::Closed)?;
            self.release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(10))
                .map_err(|_| SinkError::Closed)?;
        }
        self.delivered.emit(event)
    }
}

#[test]
fn blocked_sink_does_not_stall_other_tasks() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let sink = Arc::new(GateSink {
        gated_job: "slow",
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        delivered: RecordingSink::new(),
    });
    let controller = Arc::new(LineageController::with_defaults(sink.clone()));

    thread::scope(|scope| {
        let slow = {
            let controller = Arc::clone(&controller);
            scope.spawn(move || controller.on_task_start("slow", ["raw"]))
        };

        entered_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("slow emission should start");

        // The slow task's emission is parked inside the sink.
        controller.on_task_start("fast", ["raw"]).unwrap();
        controller.on_task_end("fast", ["clean"]).unwrap();
        assert!(controller.in_flight_tasks().contains(&"slow".to_owned()));

        release_tx.send(()).unwrap();
        slow.join().unwrap().unwrap();
    });

    let jobs: Vec<String> = sink
        .delivered
        .events()
        .iter()
        .map(|e| e.job().name.clone())
        .collect();
    assert_eq!(jobs, vec!["fast", "fast", "slow"]);
}
