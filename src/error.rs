//! Error types for corpus preparation and per-request inference.
//!
//! Preparation errors are fatal and abort startup. Inference errors are
//! scoped to a single request and reported back to the caller.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while preparing the training corpus.
#[derive(Debug, Error)]
pub enum DataPreparationError {
    /// A column the pipeline depends on is absent from the dataset.
    #[error("Required column '{column}' not found in dataset")]
    MissingColumn { column: String },

    /// No complete rows remain after dropping records with missing values.
    #[error("Dataset has no complete rows after dropping missing values")]
    EmptyCorpus,

    /// A candidate feature is neither numeric nor a declared categorical attribute.
    #[error("Candidate column '{column}' has non-numeric type {dtype} and is not a categorical attribute")]
    NonNumericColumn { column: String, dtype: String },

    /// Too few candidate columns remain to fill the feature subset.
    #[error("Feature selection needs {required} candidate columns, found {found}")]
    InsufficientCandidates { required: usize, found: usize },

    /// The label column carries a single class, so there is nothing to learn.
    #[error("Label column '{column}' contains a single class")]
    SingleClass { column: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Errors raised by the encoder registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("No encoder registered for attribute '{0}'")]
    UnknownAttribute(String),
}

/// Errors raised while serving a single prediction.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A numeric feature received a value that does not parse as a number.
    #[error("could not convert value '{value}' for '{attribute}' to float")]
    NonNumericValue { attribute: String, value: String },

    /// The aligned row does not match the width the classifier was trained on.
    #[error("X has {found} features, but the classifier is expecting {expected} features as input")]
    FeatureMismatch { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_display() {
        let err = DataPreparationError::MissingColumn {
            column: "Diet_Recommendation".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Required column 'Diet_Recommendation' not found in dataset"
        );
    }

    #[test]
    fn test_insufficient_candidates_display() {
        let err = DataPreparationError::InsufficientCandidates {
            required: 6,
            found: 4,
        };
        assert_eq!(
            err.to_string(),
            "Feature selection needs 6 candidate columns, found 4"
        );
    }

    #[test]
    fn test_encode_error_converts_into_inference_error() {
        let err: InferenceError = EncodeError::UnknownAttribute("Mood".to_string()).into();
        assert!(matches!(err, InferenceError::Encode(_)));
        assert_eq!(err.to_string(), "No encoder registered for attribute 'Mood'");
    }

    #[test]
    fn test_non_numeric_value_display() {
        let err = InferenceError::NonNumericValue {
            attribute: "BMI".to_string(),
            value: "heavy".to_string(),
        };
        assert!(err.to_string().contains("BMI"));
        assert!(err.to_string().contains("heavy"));
    }
}
