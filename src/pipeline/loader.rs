//! Dataset loader for CSV and Parquet files

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

use crate::utils::run_with_spinner;

/// Load a dataset lazily from a file (CSV or Parquet based on extension)
///
/// # Arguments
/// * `path` - Dataset file
/// * `infer_schema_length` - Rows used for CSV type inference (0 = full scan)
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(schema_length)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    Ok(lf)
}

/// Load and collect a dataset behind a spinner.
///
/// # Returns
/// The collected DataFrame with its row count, column count and estimated size in MB
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    let df = run_with_spinner(
        &format!("Loading {}...", path.display()),
        || -> Result<DataFrame> {
            load_dataset(path, infer_schema_length)?
                .collect()
                .with_context(|| format!("Failed to read dataset: {}", path.display()))
        },
        |df| format!("Loaded {} rows x {} columns", df.height(), df.width()),
    )?;

    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    tracing::debug!(rows, cols, memory_mb, path = %path.display(), "dataset loaded");
    Ok((df, rows, cols, memory_mb))
}
