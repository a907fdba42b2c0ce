//! Shaping the filtered dataset into the series each chart plots.
//!
//! Missing values are skipped throughout. Rows with a missing category are
//! left out of per-category results, except for the histogram split where
//! they form their own group.

use std::collections::{BTreeMap, HashMap};

use time::PrimitiveDateTime;

use crate::dataset::{Dataset, TIMESTAMP_FORMAT};

/// The number of equal-width bins in the histogram.
pub(super) const HISTOGRAM_BINS: usize = 30;

/// Bin labels and one row of counts per group.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Histogram {
    pub labels: Vec<String>,
    /// Group name and bin counts, groups in order of first appearance.
    pub series: Vec<(String, Vec<f64>)>,
}

#[derive(Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Mean of `y` per distinct timestamp, in chronological order.
///
/// Timestamps whose `y` values are all missing are kept with a `None` mean
/// so the line shows a gap.
pub(super) fn mean_by_timestamp(
    dataset: &Dataset,
    temporal: &str,
    y: &str,
) -> (Vec<String>, Vec<Option<f64>>) {
    let (Some(time_index), Some(y_index)) = (dataset.column_index(temporal), dataset.column_index(y))
    else {
        return (Vec::new(), Vec::new());
    };

    let mut means: BTreeMap<PrimitiveDateTime, Mean> = BTreeMap::new();

    for row in dataset.rows() {
        let Some(timestamp) = row[time_index].as_timestamp() else {
            continue;
        };

        let mean = means.entry(timestamp).or_default();
        if let Some(value) = row[y_index].as_f64() {
            mean.add(value);
        }
    }

    means
        .into_iter()
        .map(|(timestamp, mean)| {
            let label = timestamp
                .format(TIMESTAMP_FORMAT)
                .unwrap_or_else(|_| timestamp.to_string());
            (label, mean.value())
        })
        .unzip()
}

/// Counts the values of `y` in [HISTOGRAM_BINS] equal-width bins spanning its range.
///
/// With a `color` column the counts are split by its values, one series per value.
pub(super) fn histogram(dataset: &Dataset, y: &str, color: Option<&str>) -> Histogram {
    let Some(y_index) = dataset.column_index(y) else {
        return Histogram::default();
    };
    let color_index = color.and_then(|color| dataset.column_index(color));

    let points: Vec<(String, f64)> = dataset
        .rows()
        .iter()
        .filter_map(|row| {
            let value = row[y_index].as_f64()?;
            let group = match color_index {
                Some(index) => row[index].category_key(),
                None => "count".to_owned(),
            };
            Some((group, value))
        })
        .collect();

    if points.is_empty() {
        return Histogram::default();
    }

    let (min, max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &(_, value)| {
            (min.min(value), max.max(value))
        });

    // All values equal: a single bin holds everything.
    let bin_count = if max > min { HISTOGRAM_BINS } else { 1 };
    let width = if max > min { (max - min) / bin_count as f64 } else { 1.0 };

    let labels = (0..bin_count)
        .map(|bin| {
            let start = min + width * bin as f64;
            let end = if bin + 1 == bin_count { max.max(start) } else { start + width };
            format!("{start:.2} to {end:.2}")
        })
        .collect();

    let mut series: Vec<(String, Vec<f64>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (group, value) in points {
        let position = *positions.entry(group.clone()).or_insert_with(|| {
            series.push((group, vec![0.0; bin_count]));
            series.len() - 1
        });

        // The maximum falls into the last bin rather than one past it.
        let bin = (((value - min) / width) as usize).min(bin_count - 1);
        series[position].1[bin] += 1.0;
    }

    Histogram { labels, series }
}

/// Mean of `y` per value of `x`, categories in ascending order.
pub(super) fn mean_by_category(
    dataset: &Dataset,
    x: &str,
    y: &str,
) -> (Vec<String>, Vec<Option<f64>>) {
    let (Some(x_index), Some(y_index)) = (dataset.column_index(x), dataset.column_index(y)) else {
        return (Vec::new(), Vec::new());
    };

    let mut means: BTreeMap<String, Mean> = BTreeMap::new();

    for row in dataset.rows() {
        if row[x_index].is_missing() {
            continue;
        }

        let mean = means.entry(row[x_index].category_key()).or_default();
        if let Some(value) = row[y_index].as_f64() {
            mean.add(value);
        }
    }

    means
        .into_iter()
        .map(|(category, mean)| (category, mean.value()))
        .unzip()
}

/// The number of rows per value of `x`, largest first.
pub(super) fn category_counts(dataset: &Dataset, x: &str) -> Vec<(String, f64)> {
    let Some(x_index) = dataset.column_index(x) else {
        return Vec::new();
    };

    let mut counts: BTreeMap<String, f64> = BTreeMap::new();

    for row in dataset.rows() {
        if !row[x_index].is_missing() {
            *counts.entry(row[x_index].category_key()).or_default() += 1.0;
        }
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    // Stable sort keeps ties in alphabetical order.
    counts.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    counts
}

/// Pearson correlation between every pair of `columns`.
///
/// Each pair only uses rows where both values are present. A pair with
/// fewer than two such rows, or where either column is constant, has no
/// correlation.
pub(super) fn correlation_matrix(dataset: &Dataset, columns: &[String]) -> Vec<Vec<Option<f64>>> {
    let values: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|column| match dataset.column_index(column) {
            Some(index) => dataset.values(index).map(|value| value.as_f64()).collect(),
            None => vec![None; dataset.len()],
        })
        .collect();

    (0..columns.len())
        .map(|i| {
            (0..columns.len())
                .map(|j| pearson(&values[i], &values[j]).map(|r| if i == j { 1.0 } else { r }))
                .collect()
        })
        .collect()
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(&a, &b)| Some((a?, b?)))
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut covariance, mut variance_a, mut variance_b) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        covariance += (a - mean_a) * (b - mean_b);
        variance_a += (a - mean_a).powi(2);
        variance_b += (b - mean_b).powi(2);
    }

    if variance_a == 0.0 || variance_b == 0.0 {
        return None;
    }

    Some((covariance / (variance_a * variance_b).sqrt()).clamp(-1.0, 1.0))
}
