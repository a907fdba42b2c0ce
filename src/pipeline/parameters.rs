//! Resolving the requested chart and summary columns against the columns
//! that actually exist after filtering.

use serde::Serialize;

use crate::pipeline::{ColumnClassification, FilterSelection};

/// The columns each chart is drawn from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartParameters {
    /// Categorical column for the bar and pie charts.
    pub x: Option<String>,
    /// Numeric column for the line, histogram and bar charts.
    pub y: Option<String>,
    /// Categorical column that splits the histogram.
    pub color: Option<String>,
}

/// The columns of the grouped summary table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationParameters {
    /// Categorical column to group rows by.
    pub group_by: Option<String>,
    /// Numeric columns to aggregate per group.
    pub columns: Vec<String>,
}

/// Picks the chart columns, falling back to the first column of the right
/// kind when the requested one is absent or no longer qualifies.
///
/// Color has "none" as its first option, so it falls back to `None`.
pub(super) fn resolve_chart_parameters(
    selection: &FilterSelection,
    classification: &ColumnClassification,
) -> ChartParameters {
    ChartParameters {
        x: pick_or_first(selection.x.as_deref(), &classification.categorical),
        y: pick_or_first(selection.y.as_deref(), &classification.numeric),
        color: pick(selection.color.as_deref(), &classification.categorical),
    }
}

/// Picks the summary columns. Without a request, the first numeric column is aggregated.
pub(super) fn resolve_aggregation_parameters(
    selection: &FilterSelection,
    classification: &ColumnClassification,
) -> AggregationParameters {
    let columns = match &selection.agg_columns {
        Some(requested) => {
            let mut columns: Vec<String> = Vec::with_capacity(requested.len());
            for column in requested {
                if classification.numeric.contains(column) && !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
            columns
        }
        None => classification.numeric.iter().take(1).cloned().collect(),
    };

    AggregationParameters {
        group_by: pick_or_first(selection.group_by.as_deref(), &classification.categorical),
        columns,
    }
}

fn pick(requested: Option<&str>, options: &[String]) -> Option<String> {
    requested
        .and_then(|requested| options.iter().find(|option| option.as_str() == requested))
        .cloned()
}

fn pick_or_first(requested: Option<&str>, options: &[String]) -> Option<String> {
    pick(requested, options).or_else(|| options.first().cloned())
}

#[cfg(test)]
mod tests {
    use crate::pipeline::{ColumnClassification, FilterSelection};

    use super::{resolve_aggregation_parameters, resolve_chart_parameters};

    fn get_test_classification() -> ColumnClassification {
        ColumnClassification {
            temporal: None,
            categorical: vec!["channel".to_owned(), "product".to_owned()],
            numeric: vec!["Amount".to_owned(), "Value".to_owned()],
        }
    }

    #[test]
    fn keeps_valid_requests() {
        let selection = FilterSelection {
            x: Some("product".to_owned()),
            y: Some("Value".to_owned()),
            color: Some("channel".to_owned()),
            ..Default::default()
        };

        let parameters = resolve_chart_parameters(&selection, &get_test_classification());

        assert_eq!(parameters.x.as_deref(), Some("product"));
        assert_eq!(parameters.y.as_deref(), Some("Value"));
        assert_eq!(parameters.color.as_deref(), Some("channel"));
    }

    #[test]
    fn falls_back_to_first_column_of_required_kind() {
        let selection = FilterSelection {
            // Numeric and categorical requests in the wrong slots.
            x: Some("Amount".to_owned()),
            y: Some("channel".to_owned()),
            color: Some("Amount".to_owned()),
            ..Default::default()
        };

        let parameters = resolve_chart_parameters(&selection, &get_test_classification());

        assert_eq!(parameters.x.as_deref(), Some("channel"));
        assert_eq!(parameters.y.as_deref(), Some("Amount"));
        assert_eq!(parameters.color, None);
    }

    #[test]
    fn nothing_selected_without_columns() {
        let selection = FilterSelection {
            x: Some("channel".to_owned()),
            y: Some("Amount".to_owned()),
            group_by: Some("channel".to_owned()),
            agg_columns: Some(vec!["Amount".to_owned()]),
            ..Default::default()
        };
        let classification = ColumnClassification::default();

        let chart = resolve_chart_parameters(&selection, &classification);
        let aggregation = resolve_aggregation_parameters(&selection, &classification);

        assert_eq!(chart, Default::default());
        assert_eq!(aggregation, Default::default());
    }

    #[test]
    fn aggregates_first_numeric_column_by_default() {
        let parameters =
            resolve_aggregation_parameters(&FilterSelection::default(), &get_test_classification());

        assert_eq!(parameters.group_by.as_deref(), Some("channel"));
        assert_eq!(parameters.columns, vec!["Amount"]);
    }

    #[test]
    fn aggregation_keeps_only_numeric_requests() {
        let selection = FilterSelection {
            group_by: Some("product".to_owned()),
            agg_columns: Some(vec![
                "Value".to_owned(),
                "channel".to_owned(),
                "Value".to_owned(),
                "Amount".to_owned(),
            ]),
            ..Default::default()
        };

        let parameters = resolve_aggregation_parameters(&selection, &get_test_classification());

        assert_eq!(parameters.group_by.as_deref(), Some("product"));
        assert_eq!(parameters.columns, vec!["Value", "Amount"]);
    }

    #[test]
    fn explicitly_empty_aggregation_stays_empty() {
        let selection = FilterSelection {
            agg_columns: Some(Vec::new()),
            ..Default::default()
        };

        let parameters = resolve_aggregation_parameters(&selection, &get_test_classification());

        assert!(parameters.columns.is_empty());
    }
}
