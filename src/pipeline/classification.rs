//! Partitioning columns into temporal, categorical and numeric sets.

use serde::Serialize;

use crate::dataset::{ColumnType, Dataset};

/// The column names of a dataset grouped by how the dashboard can use them.
///
/// `categorical` and `numeric` are disjoint and keep the dataset's column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnClassification {
    /// The normalized timestamp column, if there is one.
    pub temporal: Option<String>,
    /// Text columns.
    pub categorical: Vec<String>,
    /// Integer and float columns.
    pub numeric: Vec<String>,
}

/// Classify the columns of `dataset` by their current types.
pub fn classify(dataset: &Dataset) -> ColumnClassification {
    let mut classification = ColumnClassification::default();

    for column in dataset.columns() {
        match column.dtype {
            ColumnType::Temporal if classification.temporal.is_none() => {
                classification.temporal = Some(column.name.clone())
            }
            dtype if dtype.is_categorical() => classification.categorical.push(column.name.clone()),
            dtype if dtype.is_numeric() => classification.numeric.push(column.name.clone()),
            _ => {}
        }
    }

    classification
}
