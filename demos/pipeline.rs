//! An ETL-style pipeline where every step simulates a slow external call.
//!
//! Run with `RUST_LOG=debug` to see which resolver owns each task and which
//! ones wait on a task already in flight.

use std::time::Duration;

use serde_json::{Value, json};
use upstream::{Blueprint, Executor};

/// Stand-in for an API call, the delay is derived from the step name so runs
/// are reproducible.
async fn simulate_api_call(step: &str) {
    let millis = 100 + (step.len() as u64 * 37) % 400;
    tracing::info!(step, millis, "simulating API call");
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn step(blueprint: &mut Blueprint<Value>, name: &'static str, upstream: &[&str], output: Value) {
    blueprint
        .task(name)
        .depends_on(upstream.iter().copied())
        .run(move |inputs| {
            let output = output.clone();
            async move {
                tracing::info!(step = name, ?inputs, "running");
                simulate_api_call(name).await;
                Ok(output)
            }
        });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    upstream::init_logging()?;

    let mut blueprint = Blueprint::new();

    step(&mut blueprint, "start_pipeline", &[], json!("Pipeline Started"));
    step(&mut blueprint, "extract_data_a", &["start_pipeline"], json!({"data_a": "raw data A"}));
    step(&mut blueprint, "extract_data_b", &["start_pipeline"], json!({"data_b": "raw data B"}));
    step(&mut blueprint, "clean_data_a", &["extract_data_a"], json!({"data_a": "cleaned data A"}));
    step(&mut blueprint, "clean_data_b", &["extract_data_b"], json!({"data_b": "cleaned data B"}));
    step(&mut blueprint, "transform_data_a", &["clean_data_a"], json!({"data_a": "transformed data A"}));
    step(&mut blueprint, "transform_data_b", &["clean_data_b"], json!({"data_b": "transformed data B"}));
    step(
        &mut blueprint,
        "merge_data",
        &["transform_data_a", "transform_data_b"],
        json!({"data": "merged data"}),
    );
    step(&mut blueprint, "load_data", &["merge_data"], json!({"data": "loaded data"}));
    step(&mut blueprint, "analyze_data", &["load_data"], json!({"data": "analyzed data"}));
    step(&mut blueprint, "validate_data", &["load_data"], json!({"data": "validated data"}));
    step(&mut blueprint, "archive_data", &["load_data"], json!({"data": "archived data"}));
    step(
        &mut blueprint,
        "additional_processing_a",
        &["transform_data_a"],
        json!({"data_a": "additional processed data A"}),
    );
    step(
        &mut blueprint,
        "additional_processing_b",
        &["transform_data_b"],
        json!({"data_b": "additional processed data B"}),
    );
    step(
        &mut blueprint,
        "integrate_additional_data",
        &["additional_processing_a", "additional_processing_b"],
        json!({"data": "integrated additional data"}),
    );
    step(
        &mut blueprint,
        "generate_report",
        &["analyze_data", "validate_data", "integrate_additional_data"],
        json!({"report": "data analysis report"}),
    );
    step(
        &mut blueprint,
        "main",
        &["generate_report", "archive_data"],
        json!("Pipeline Completed"),
    );

    let registry = blueprint.finish()?;

    tracing::debug!("dependency graph:\n{}", registry.to_dot());

    let outputs = Executor::new().run(&registry).await?;
    println!("Results:\n{}", serde_json::to_string_pretty(&outputs)?);

    Ok(())
}
