//! Drive a small pipeline through the controller and print its events as
//! JSON lines on stdout.
//!
//! ```text
//! LINEAGE_NAMESPACE=demo cargo run -p lineage-emitter --example trace_pipeline
//! ```

use std::sync::Arc;

use lineage_emitter::{EmitterConfig, JsonLinesSink, LineageController};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _guard = lineage_log::auto_init()?;

    let config = EmitterConfig::from_env();
    let controller = LineageController::new(config, Arc::new(JsonLinesSink::stdout()))?;

    controller.on_pipeline_run_start("example_pipeline")?;

    controller.on_task_start("preprocess", ["companies", "shuttles"])?;
    controller.on_task_end(
        "preprocess",
        ["preprocessed_companies", "preprocessed_shuttles"],
    )?;

    controller.on_task_start("train", ["preprocessed_companies", "preprocessed_shuttles"])?;
    controller.on_task_end("train", ["regressor"])?;

    controller.on_pipeline_run_end()?;
    Ok(())
}
