//! Corpus transformations applied before encoding
//!
//! Each step is a separate function so callers (and tests) decide which ones
//! run. Label noise in particular is opt-out through `PipelineConfig`.

use std::collections::BTreeSet;

use polars::prelude::*;
use rand::seq::index;
use rand::Rng;

use super::columns::column_to_string_vec;

/// Disease value that stands for "no disease" in the raw dataset
const NO_DISEASE_RAW: &str = "None";

/// Replacement label for patients without a disease
const NO_DISEASE_LABEL: &str = "Healthy";

/// Replace `"None"` disease values with `"Healthy"`.
///
/// Returns the number of rows rewritten.
pub fn normalize_disease_labels(df: &mut DataFrame, column: &str) -> PolarsResult<usize> {
    let values = column_to_string_vec(df.column(column)?)?;

    let mut replaced = 0usize;
    let normalized: Vec<Option<String>> = values
        .into_iter()
        .map(|v| match v {
            Some(s) if s == NO_DISEASE_RAW => {
                replaced += 1;
                Some(NO_DISEASE_LABEL.to_string())
            }
            other => other,
        })
        .collect();

    if replaced > 0 {
        df.with_column(Column::new(column.into(), normalized))?;
    }
    Ok(replaced)
}

/// Keep only rows with a value in every one of `columns`
pub fn drop_incomplete_rows(df: &DataFrame, columns: &[String]) -> PolarsResult<DataFrame> {
    let mut mask = BooleanChunked::full("complete".into(), true, df.height());
    for name in columns {
        let not_null = df.column(name)?.is_not_null();
        mask = &mask & &not_null;
    }
    df.filter(&mask)
}

/// Outcome of a label-noise pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelNoise {
    /// Rows whose label was redrawn
    pub resampled: usize,
    /// Redrawn rows that ended up with a different label
    pub changed: usize,
}

/// Overwrite a fraction of the label column with random labels.
///
/// `floor(rows * fraction)` distinct rows are picked uniformly; each receives
/// a label drawn uniformly from the sorted set of labels present in the
/// column. A draw may repeat the row's current label, so `changed` can be
/// lower than `resampled`.
pub fn inject_label_noise<R: Rng + ?Sized>(
    df: &mut DataFrame,
    label_column: &str,
    fraction: f64,
    rng: &mut R,
) -> PolarsResult<LabelNoise> {
    let rows = df.height();
    let count = ((rows as f64) * fraction.clamp(0.0, 1.0)).floor() as usize;
    if count == 0 {
        return Ok(LabelNoise::default());
    }

    let mut labels = column_to_string_vec(df.column(label_column)?)?;
    let domain: Vec<String> = labels
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if domain.is_empty() {
        return Ok(LabelNoise::default());
    }

    let mut changed = 0usize;
    for row in index::sample(rng, rows, count).into_iter() {
        let pick = &domain[rng.gen_range(0..domain.len())];
        if labels[row].as_deref() != Some(pick.as_str()) {
            changed += 1;
            labels[row] = Some(pick.clone());
        }
    }

    if changed > 0 {
        df.with_column(Column::new(label_column.into(), labels))?;
    }
    Ok(LabelNoise {
        resampled: count,
        changed,
    })
}
