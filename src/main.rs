//! dietrec: diet recommendation service
//!
//! Trains a random forest on a patient dataset at startup, then either
//! serves predictions over HTTP or prints the training summary.

mod cli;
mod error;
mod pipeline;
mod report;
mod server;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use cli::{init_tracing, Cli, Commands};
use pipeline::{load_dataset_with_progress, DatasetSchema, InferencePipeline};
use report::{export_training_report, TrainingSummary};
use utils::{
    print_banner, print_config, print_count, print_info, print_ready, print_step_header,
    print_step_time, print_success, run_with_spinner,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let training = cli.command.training();
    let config = training.pipeline_config();

    // Print styled banner
    print_banner(env!("CARGO_PKG_VERSION"));

    // Print configuration card
    print_config(&training.input, &config);

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");

    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) =
        load_dataset_with_progress(&training.input, training.infer_schema_length)?;
    print_success("Dataset loaded");

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
    print_step_time(step_start.elapsed());

    // Step 2: Prepare the corpus and fit the classifier
    print_step_header(2, "Train Classifier");

    let step_start = Instant::now();
    let pipeline = run_with_spinner(
        "Ranking features and fitting forest...",
        || InferencePipeline::fit(df, &DatasetSchema::default(), &config),
        |p| format!("Classifier trained on {} features", p.feature_subset().len()),
    )
    .context("Failed to train the diet classifier")?;

    let stats = pipeline.stats();
    if stats.preparation.rows_dropped > 0 {
        print_count(
            "row(s) dropped",
            stats.preparation.rows_dropped,
            Some("(missing values)"),
        );
    }
    if stats.preparation.labels_resampled > 0 {
        print_count(
            "label(s) changed by noise",
            stats.preparation.labels_changed,
            Some(&format!(
                "({} resampled, {:.1}%)",
                stats.preparation.labels_resampled,
                config.label_noise * 100.0
            )),
        );
    }
    print_info(&format!(
        "Features: {}",
        pipeline.feature_subset().names().join(", ")
    ));
    print_step_time(step_start.elapsed());

    match &cli.command {
        Commands::Inspect { export, .. } => {
            TrainingSummary::from_pipeline(&pipeline).display();

            if let Some(path) = export {
                let input_file = training.input.display().to_string();
                export_training_report(&pipeline, &input_file, &config, path)?;
                print_success(&format!("Training report saved to {}", path.display()));
            }

            print_ready("Inspection complete");
            Ok(())
        }
        Commands::Serve {
            host,
            port,
            allow_origins,
            ..
        } => {
            let addr = SocketAddr::new(*host, *port);
            let router = server::router(Arc::new(pipeline), allow_origins)?;

            print_ready(&format!("Serving POST http://{}/predict", addr));

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?
                .block_on(server::serve(router, addr))
        }
    }
}
