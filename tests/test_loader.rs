//! Tests for dataset loading

use dietrec::pipeline::{
    column_to_string_vec, load_dataset, load_dataset_with_progress, DatasetSchema,
    InferencePipeline,
};
use polars::prelude::*;
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_load_diet_corpus_csv() {
    let mut df = create_diet_corpus(30);
    let (_temp_dir, csv_path) = create_temp_csv(&mut df);

    let (loaded, rows, cols, mem_mb) = load_dataset_with_progress(&csv_path, 100).unwrap();

    assert_shape(&loaded, 30, 12);
    assert_eq!(rows, 30);
    assert_eq!(cols, 12);
    assert!(mem_mb > 0.0);
    assert!(loaded.column("Age").unwrap().dtype().is_primitive_numeric());
    assert!(loaded.column("BMI").unwrap().dtype().is_primitive_numeric());
}

#[test]
fn test_load_diet_corpus_parquet() {
    let mut df = create_diet_corpus(30);
    let (_temp_dir, parquet_path) = create_temp_parquet(&mut df);

    let (loaded, rows, cols, _) = load_dataset_with_progress(&parquet_path, 100).unwrap();

    assert_eq!((rows, cols), (30, 12));
    assert_eq!(loaded.get_column_names(), df.get_column_names());
}

#[test]
fn test_literal_none_is_kept_as_text() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("diseases.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "Disease_Type,Allergies").unwrap();
    writeln!(file, "None,Peanuts").unwrap();
    writeln!(file, "Diabetes,None").unwrap();
    drop(file);

    let df = load_dataset(&csv_path, 100).unwrap().collect().unwrap();
    let diseases = column_to_string_vec(df.column("Disease_Type").unwrap()).unwrap();
    let allergies = column_to_string_vec(df.column("Allergies").unwrap()).unwrap();

    assert_eq!(diseases, vec![Some("None".to_string()), Some("Diabetes".to_string())]);
    assert_eq!(allergies[1], Some("None".to_string()));
}

#[test]
fn test_empty_fields_load_as_null() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("missing.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "Age,BMI,Gender").unwrap();
    writeln!(file, "34,,Male").unwrap();
    writeln!(file, ",22.5,").unwrap();
    writeln!(file, "51,30.1,Female").unwrap();
    drop(file);

    let (df, rows, _, _) = load_dataset_with_progress(&csv_path, 100).unwrap();

    assert_eq!(rows, 3);
    let null_counts: Vec<usize> = df.get_columns().iter().map(|c| c.null_count()).collect();
    assert_eq!(null_counts, vec![1, 1, 1]);
}

#[test]
fn test_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    let bad_path = temp_dir.path().join("test.xlsx");
    std::fs::File::create(&bad_path).unwrap();

    let result = load_dataset_with_progress(&bad_path, 100);

    assert!(result.is_err(), "Unsupported format should return error");
    let err_msg = result.unwrap_err().to_string();
    assert!(
        err_msg.contains("Unsupported"),
        "Error message should mention unsupported format: {}",
        err_msg
    );
}

#[test]
fn test_nonexistent_file() {
    let path = std::path::Path::new("/nonexistent/path/to/diet.csv");

    assert!(load_dataset_with_progress(path, 100).is_err());
}

#[test]
fn test_full_scan_schema_inference() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("inference.csv");

    // Integers for the first 50 rows, then a fraction
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "BMI").unwrap();
    for i in 0..50 {
        writeln!(file, "{}", 20 + i % 10).unwrap();
    }
    writeln!(file, "27.5").unwrap();
    drop(file);

    let (df, _, _, _) = load_dataset_with_progress(&csv_path, 0).unwrap();
    assert_eq!(df.column("BMI").unwrap().dtype(), &DataType::Float64);
}

#[test]
fn test_train_from_loaded_csv() {
    let mut df = create_diet_corpus(120);
    let (_temp_dir, csv_path) = create_temp_csv(&mut df);

    let (loaded, _, _, _) = load_dataset_with_progress(&csv_path, 0).unwrap();
    let pipeline =
        InferencePipeline::fit(loaded, &DatasetSchema::default(), &fast_config()).unwrap();

    assert_eq!(pipeline.stats().preparation.diseases_normalized, 30);
    assert!(pipeline.predict(&sample_request()).is_ok());
}
