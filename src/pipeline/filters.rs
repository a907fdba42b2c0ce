//! The sign filter and the per-category filters.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{
    Error,
    config::{MissingAmountPolicy, PipelineConfig},
    dataset::Dataset,
};

/// The values offered and chosen for one categorical column's filter widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOptions {
    /// The categorical column.
    pub column: String,
    /// The distinct values left after the filters of earlier columns, in order of first appearance.
    pub available: Vec<String>,
    /// The subset of `available` that rows were restricted to.
    pub selected: Vec<String>,
}

/// Drops rows whose amount is negative or missing.
///
/// # Errors
/// Returns [Error::MissingColumn] if the amount column is absent or not
/// numeric and the config's policy is [MissingAmountPolicy::Reject].
pub(super) fn exclude_negative_amounts(
    dataset: &mut Dataset,
    config: &PipelineConfig,
) -> Result<(), Error> {
    let amount_column = &config.amount_column;

    let index = dataset
        .column_index(amount_column)
        .filter(|&index| dataset.columns()[index].dtype.is_numeric());

    let Some(index) = index else {
        return match config.missing_amount {
            MissingAmountPolicy::Ignore => {
                tracing::warn!(
                    "Ignoring the negative amount filter: there is no numeric '{amount_column}' column"
                );
                Ok(())
            }
            MissingAmountPolicy::Reject => Err(Error::MissingColumn(amount_column.to_owned())),
        };
    };

    dataset.retain(|row| row[index].as_f64().is_some_and(|amount| amount >= 0.0));

    Ok(())
}

/// Restricts rows to the selected values of each categorical column in turn.
///
/// The values offered for a column are observed after the preceding columns
/// have been filtered but before the column's own filter. Columns without a
/// selection keep every offered value, and so do columns whose `previously_offered`
/// values differ from the ones offered now.
pub(super) fn filter_categories(
    dataset: &mut Dataset,
    categorical: &[String],
    selections: &BTreeMap<String, Vec<String>>,
    previously_offered: &BTreeMap<String, Vec<String>>,
) -> Vec<CategoryOptions> {
    let mut options = Vec::with_capacity(categorical.len());

    for column in categorical {
        let Some(index) = dataset.column_index(column) else {
            continue;
        };

        let available = dataset.unique_categories(index);
        let offer_changed = previously_offered
            .get(column)
            .is_some_and(|previous| !same_values(previous, &available));

        if offer_changed {
            tracing::debug!("Values offered for '{column}' changed, selecting all of them");
        }

        let selected = match selections.get(column).filter(|_| !offer_changed) {
            Some(requested) => {
                let requested: HashSet<&str> = requested.iter().map(String::as_str).collect();
                available
                    .iter()
                    .filter(|value| requested.contains(value.as_str()))
                    .cloned()
                    .collect()
            }
            None => available.clone(),
        };

        if selected.len() < available.len() {
            let keep: HashSet<&str> = selected.iter().map(String::as_str).collect();
            dataset.retain(|row| keep.contains(row[index].category_key().as_str()));
        }

        options.push(CategoryOptions {
            column: column.clone(),
            available,
            selected,
        });
    }

    options
}

fn same_values(left: &[String], right: &[String]) -> bool {
    let left: HashSet<&str> = left.iter().map(String::as_str).collect();
    let right: HashSet<&str> = right.iter().map(String::as_str).collect();

    left == right
}
