//! Shared test utilities and fixture generators
#![allow(dead_code)]

use dietrec::pipeline::{DatasetSchema, PipelineConfig, RawAttributes};
use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const GENDERS: [&str; 2] = ["Male", "Female"];
const DISEASES: [&str; 4] = ["None", "Diabetes", "Hypertension", "Obesity"];
const SEVERITIES: [&str; 3] = ["Mild", "Moderate", "Severe"];
const ACTIVITY: [&str; 3] = ["Sedentary", "Moderate", "Active"];
const ALLERGIES: [&str; 3] = ["None", "Peanuts", "Gluten"];
const CUISINES: [&str; 4] = ["Italian", "Chinese", "Indian", "Mexican"];
const RESTRICTIONS: [&str; 3] = ["None", "Low_Sugar", "Low_Sodium"];

/// Diet a patient in the synthetic corpus is assigned.
///
/// Driven by disease and BMI so both a categorical and a numeric attribute
/// carry signal.
fn diet_for(disease: &str, bmi: f64) -> &'static str {
    match disease {
        "Diabetes" => "Low_Carb",
        "Hypertension" => "Low_Sodium",
        "Obesity" if bmi > 28.0 => "Low_Carb",
        _ => "Balanced",
    }
}

fn cycle(values: &[&str], rows: usize, index: impl Fn(usize) -> usize) -> Vec<String> {
    (0..rows)
        .map(|i| values[index(i) % values.len()].to_string())
        .collect()
}

/// Create a deterministic patient corpus with the real dataset's columns
///
/// This DataFrame includes:
/// - `Patient_ID`, `Weight_kg`, `Dietary_Restrictions`: excluded columns
/// - 6 categorical and 2 numeric candidate columns
/// - `Disease_Type` holding the literal "None" for healthy patients
/// - `Diet_Recommendation`: label driven by `Disease_Type` and `BMI`
pub fn create_diet_corpus(rows: usize) -> DataFrame {
    let ids: Vec<String> = (0..rows).map(|i| format!("P{:04}", i)).collect();
    let ages: Vec<i64> = (0..rows).map(|i| 20 + ((i * 7) % 50) as i64).collect();
    let bmi: Vec<f64> = (0..rows)
        .map(|i| 18.5 + ((i * 13) % 200) as f64 / 10.0)
        .collect();
    let weight: Vec<f64> = (0..rows).map(|i| 55.0 + (i % 40) as f64).collect();
    let disease = cycle(&DISEASES, rows, |i| i);
    let diet: Vec<String> = disease
        .iter()
        .zip(&bmi)
        .map(|(d, b)| diet_for(d, *b).to_string())
        .collect();

    df! {
        "Patient_ID" => ids,
        "Age" => ages,
        "Gender" => cycle(&GENDERS, rows, |i| i / 5),
        "Weight_kg" => weight,
        "BMI" => bmi,
        "Disease_Type" => disease,
        "Severity" => cycle(&SEVERITIES, rows, |i| i / 2),
        "Physical_Activity_Level" => cycle(&ACTIVITY, rows, |i| i / 3),
        "Dietary_Restrictions" => cycle(&RESTRICTIONS, rows, |i| i),
        "Allergies" => cycle(&ALLERGIES, rows, |i| i / 7),
        "Preferred_Cuisine" => cycle(&CUISINES, rows, |i| i / 4),
        "Diet_Recommendation" => diet,
    }
    .unwrap()
}

/// Corpus with three categorical attributes of two values each and one numeric column
pub fn create_small_categorical_corpus() -> DataFrame {
    df! {
        "Color" => ["red", "blue", "red", "blue", "red", "blue", "red", "blue"],
        "Size" => ["S", "S", "L", "L", "S", "S", "L", "L"],
        "Shape" => ["round", "square", "square", "round", "round", "square", "square", "round"],
        "Weight" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        "Label" => ["a", "b", "a", "b", "a", "b", "a", "b"],
    }
    .unwrap()
}

/// Schema matching [`create_small_categorical_corpus`]
pub fn small_categorical_schema() -> DatasetSchema {
    DatasetSchema {
        label: "Label".to_string(),
        categorical: vec!["Color".to_string(), "Size".to_string(), "Shape".to_string()],
        excluded: Vec::new(),
        disease_column: "Disease".to_string(),
    }
}

/// Deterministic configuration with a small forest
pub fn fast_config() -> PipelineConfig {
    let mut config = PipelineConfig {
        noise_seed: Some(7),
        ..Default::default()
    };
    config.forest.n_trees = 15;
    config
}

/// A request carrying every field the HTTP endpoint accepts
pub fn sample_request() -> RawAttributes {
    RawAttributes::new()
        .with("Preferred_Cuisine", "Italian")
        .with("Age", 45i64)
        .with("Physical_Activity_Level", "Moderate")
        .with("BMI", 31.2)
        .with("Disease_Type", "Diabetes")
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}
