//! The grouped mean/sum/count table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Dataset;

/// Mean, sum and count of one numeric column within one group.
///
/// Missing values are skipped. `mean` is `None` when every value was missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Mean of the present values, rounded to two decimals.
    pub mean: Option<f64>,
    /// Sum of the present values, rounded to two decimals.
    pub sum: f64,
    /// Number of present values.
    pub count: usize,
}

/// The summaries of every aggregated column for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// The group's category value.
    pub key: String,
    /// One summary per aggregated column, in the table's column order.
    pub columns: Vec<ColumnSummary>,
}

/// Per-group summaries of numeric columns, groups sorted by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationTable {
    /// The column rows were grouped by.
    pub group_by: String,
    /// The aggregated columns.
    pub columns: Vec<String>,
    /// The groups in ascending key order.
    pub groups: Vec<GroupSummary>,
}

#[derive(Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Groups `dataset` by `group_by` and summarises each of `columns`.
///
/// Rows with a missing group key are left out. Returns `None` if `columns`
/// is empty or any named column does not exist.
pub fn aggregate(dataset: &Dataset, group_by: &str, columns: &[String]) -> Option<AggregationTable> {
    if columns.is_empty() {
        return None;
    }

    let key_index = dataset.column_index(group_by)?;
    let indices = columns
        .iter()
        .map(|column| dataset.column_index(column))
        .collect::<Option<Vec<_>>>()?;

    let mut groups: BTreeMap<String, Vec<Accumulator>> = BTreeMap::new();

    for row in dataset.rows() {
        if row[key_index].is_missing() {
            continue;
        }

        let accumulators = groups
            .entry(row[key_index].category_key())
            .or_insert_with(|| vec![Accumulator::default(); indices.len()]);

        for (accumulator, &index) in accumulators.iter_mut().zip(&indices) {
            if let Some(value) = row[index].as_f64() {
                accumulator.sum += value;
                accumulator.count += 1;
            }
        }
    }

    let groups = groups
        .into_iter()
        .map(|(key, accumulators)| GroupSummary {
            key,
            columns: accumulators
                .into_iter()
                .map(|Accumulator { sum, count }| ColumnSummary {
                    mean: (count > 0).then(|| round_to_cents(sum / count as f64)),
                    sum: round_to_cents(sum),
                    count,
                })
                .collect(),
        })
        .collect();

    Some(AggregationTable {
        group_by: group_by.to_owned(),
        columns: columns.to_vec(),
        groups,
    })
}

/// Rounds `number` to two decimal places.
pub fn round_to_cents(number: f64) -> f64 {
    (number * 100.0).round() / 100.0
}
