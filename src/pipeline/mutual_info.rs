//! Information-gain scoring for feature selection
//!
//! Every candidate column, numeric or encoded categorical, is scored with the
//! nearest-neighbour estimator for a continuous feature against a discrete
//! target (Ross, 2014) with 3 neighbours. Columns are scaled to unit variance
//! and given a tiny fixed-seed jitter first, so ties between repeated values
//! (category codes, whole-year ages) do not collapse the neighbour radius.
//! One estimator for all columns keeps the scores on the same scale.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::features::{FeatureColumn, FeatureKind, FeatureSubset};
use crate::error::DataPreparationError;

/// Neighbours used by the continuous estimator
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Seed for the tie-breaking jitter; shared by every column so identical
/// columns score identically
const JITTER_SEED: u64 = 0;

/// Jitter amplitude relative to the column's mean absolute value
const JITTER_SCALE: f64 = 1e-10;

/// Information gain of one candidate column
#[derive(Debug, Clone, Serialize)]
pub struct FeatureScore {
    pub feature: String,
    pub kind: FeatureKind,
    pub score: f64,
}

/// Score every candidate column against the label codes.
///
/// Returns scores sorted by descending information gain; ties are broken by
/// column name so the ranking is a total order.
pub fn rank_features(columns: &[FeatureColumn], labels: &[usize]) -> Vec<FeatureScore> {
    let mut scores: Vec<FeatureScore> = columns
        .par_iter()
        .map(|column| {
            let score = if is_constant(&column.values) {
                0.0
            } else {
                let prepared = scale_and_jitter(&column.values);
                continuous_mutual_information(&prepared, labels, DEFAULT_NEIGHBORS)
            };
            FeatureScore {
                feature: column.name.clone(),
                kind: column.kind,
                score: if score.is_finite() { score } else { 0.0 },
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.feature.cmp(&b.feature))
    });
    scores
}

/// Keep the `k` best-scoring columns.
///
/// The subset is ordered by ascending score, so the most informative column
/// comes last.
pub fn select_feature_subset(
    ranking: &[FeatureScore],
    k: usize,
) -> Result<FeatureSubset, DataPreparationError> {
    if ranking.len() < k {
        return Err(DataPreparationError::InsufficientCandidates {
            required: k,
            found: ranking.len(),
        });
    }

    let names = ranking[..k]
        .iter()
        .rev()
        .map(|s| s.feature.clone())
        .collect();
    Ok(FeatureSubset::new(names))
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Scale to unit variance (no centring) and add a small seeded jitter
fn scale_and_jitter(values: &[f64]) -> Vec<f64> {
    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    let scale = if std > 0.0 { std } else { 1.0 };

    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    let mean_abs = scaled.iter().map(|v| v.abs()).sum::<f64>() / n;
    let amplitude = JITTER_SCALE * mean_abs.max(1.0);

    let mut rng = StdRng::seed_from_u64(JITTER_SEED);
    scaled
        .into_iter()
        .map(|v| v + amplitude * rng.gen_range(-1.0..1.0))
        .collect()
}

/// Mutual information between a continuous feature and a discrete target.
///
/// For each sample, the distance to its k-th nearest neighbour within the
/// same class sets a radius; the number of samples of any class inside that
/// radius drives the estimate. Samples whose class occurs only once are
/// skipped.
pub fn continuous_mutual_information(x: &[f64], y: &[usize], n_neighbors: usize) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 || n_neighbors == 0 {
        return 0.0;
    }

    let mut by_class: HashMap<usize, Vec<f64>> = HashMap::new();
    for (&value, &label) in x.iter().zip(y.iter()) {
        by_class.entry(label).or_default().push(value);
    }
    for values in by_class.values_mut() {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    }

    // (value, radius, k, class count) for samples whose class has a neighbour
    let mut kept: Vec<(f64, f64, usize, usize)> = Vec::with_capacity(n);
    for (&value, label) in x.iter().zip(y.iter()) {
        let class_values = &by_class[label];
        let count = class_values.len();
        if count < 2 {
            continue;
        }
        let k = n_neighbors.min(count - 1);
        let distance = kth_neighbor_distance(class_values, value, k);
        kept.push((value, next_toward_zero(distance), k, count));
    }

    if kept.is_empty() {
        return 0.0;
    }

    let mut all: Vec<f64> = kept.iter().map(|(v, _, _, _)| *v).collect();
    all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let samples = kept.len() as f64;
    let mut mean_k = 0.0;
    let mut mean_count = 0.0;
    let mut mean_m = 0.0;
    for &(value, radius, k, count) in &kept {
        let m = count_within(&all, value, radius).max(1);
        mean_k += digamma(k as f64);
        mean_count += digamma(count as f64);
        mean_m += digamma(m as f64);
    }

    let mi = digamma(samples) + (mean_k - mean_count - mean_m) / samples;
    mi.max(0.0)
}

/// Number of entries of `sorted` at distance `<= radius` from `value`.
///
/// `value ± radius` can round onto a neighbour lying just outside the
/// radius, so the value bounds only seed the search and the window edges
/// are settled on distances.
fn count_within(sorted: &[f64], value: f64, radius: f64) -> usize {
    let inside = |i: usize| (sorted[i] - value).abs() <= radius;

    let mut lo = sorted.partition_point(|&v| v < value - radius);
    while lo > 0 && inside(lo - 1) {
        lo -= 1;
    }
    while lo < sorted.len() && !inside(lo) && sorted[lo] < value {
        lo += 1;
    }

    let mut hi = sorted.partition_point(|&v| v <= value + radius).max(lo);
    while hi < sorted.len() && inside(hi) {
        hi += 1;
    }
    while hi > lo && !inside(hi - 1) {
        hi -= 1;
    }

    hi - lo
}

/// Distance from `value` to its k-th nearest neighbour in `sorted`, excluding
/// one occurrence of `value` itself
fn kth_neighbor_distance(sorted: &[f64], value: f64, k: usize) -> f64 {
    let pos = sorted
        .partition_point(|&v| v < value)
        .min(sorted.len() - 1);
    let lo = pos.saturating_sub(k);
    let hi = (pos + k).min(sorted.len() - 1);

    let mut distances: Vec<f64> = (lo..=hi)
        .filter(|&i| i != pos)
        .map(|i| (sorted[i] - value).abs())
        .collect();
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    distances
        .get(k - 1)
        .or_else(|| distances.last())
        .copied()
        .unwrap_or(0.0)
}

/// Largest float strictly below `d` for positive `d`; zero stays zero
fn next_toward_zero(d: f64) -> f64 {
    if d > 0.0 && d.is_finite() {
        f64::from_bits(d.to_bits() - 1)
    } else {
        0.0
    }
}

/// Digamma function for positive arguments
pub fn digamma(x: f64) -> f64 {
    let mut x = x;
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}
