//! The filter and derivation pipeline.
//!
//! [derive] turns the loaded dataset and the user's [FilterSelection] into
//! everything the dashboard renders. The steps always run in this order, and
//! each one only ever removes rows:
//!
//! 1. temporal normalization (rows with unparseable timestamps are dropped),
//! 2. the date range filter,
//! 3. the negative amount filter,
//! 4. the per-category filters, column by column,
//!
//! after which the chart and summary columns are resolved against the
//! columns of the filtered dataset.

mod classification;
mod filters;
mod parameters;
mod selection;
mod summary;
mod temporal;

pub use classification::{ColumnClassification, classify};
pub use filters::CategoryOptions;
pub use parameters::{AggregationParameters, ChartParameters};
pub use selection::FilterSelection;
pub use summary::{AggregationTable, ColumnSummary, GroupSummary, aggregate, round_to_cents};
pub use temporal::{DateBounds, parse_timestamp};

pub(crate) use selection::{
    AGG, AGG_PRESENT, CATEGORY_OFFERED_PREFIX, CATEGORY_PREFIX, CATEGORY_PRESENT, COLOR, DATE_END,
    DATE_FORMAT, DATE_START, EXCLUDE_NEGATIVE, GROUP_BY, X, Y,
};

use serde::Serialize;

use crate::{Error, config::PipelineConfig, dataset::Dataset};

/// The number of rows left after each step of the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineRowCounts {
    /// Rows in the loaded dataset.
    pub loaded: usize,
    /// Rows with a valid timestamp.
    pub after_temporal_normalization: usize,
    /// Rows inside the date range.
    pub after_date_range: usize,
    /// Rows left by the negative amount filter.
    pub after_sign_filter: usize,
    /// Rows left by every category filter.
    pub after_category_filters: usize,
}

/// The filtered dataset and everything derived from it for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderResult {
    /// The rows that passed every filter.
    #[serde(skip)]
    pub dataset: Dataset,
    /// The column sets of the filtered dataset.
    pub classification: ColumnClassification,
    /// The offered and selected values of each category filter.
    pub category_options: Vec<CategoryOptions>,
    /// The date span of the normalized dataset before the date range filter.
    pub date_bounds: Option<DateBounds>,
    /// Whether negative amounts were excluded.
    pub exclude_negative: bool,
    /// The resolved chart columns.
    pub chart: ChartParameters,
    /// The resolved summary table columns.
    pub aggregation: AggregationParameters,
    /// The grouped summary table, if there is a group-by column and at least one numeric column.
    pub summary: Option<AggregationTable>,
    /// Row counts after each step.
    pub row_counts: PipelineRowCounts,
}

/// Applies `selection` to a copy of `dataset` and derives the chart and table parameters.
///
/// # Errors
/// Returns [Error::MissingColumn] if negative amounts should be excluded,
/// there is no numeric amount column, and `config` says to reject that.
pub fn derive(
    dataset: &Dataset,
    selection: &FilterSelection,
    config: &PipelineConfig,
) -> Result<RenderResult, Error> {
    let mut dataset = dataset.clone();
    let mut row_counts = PipelineRowCounts {
        loaded: dataset.len(),
        ..Default::default()
    };

    let temporal_index = temporal::normalize_temporal(&mut dataset, &config.temporal_column);
    row_counts.after_temporal_normalization = dataset.len();

    let date_bounds = temporal_index.and_then(|index| temporal::date_bounds(&dataset, index));

    if let Some(index) = temporal_index {
        temporal::filter_date_range(&mut dataset, index, &selection.date_range);
    }
    row_counts.after_date_range = dataset.len();

    if selection.exclude_negative {
        filters::exclude_negative_amounts(&mut dataset, config)?;
    }
    row_counts.after_sign_filter = dataset.len();

    let categorical = classify(&dataset).categorical;
    let category_options =
        filters::filter_categories(
            &mut dataset,
            &categorical,
            &selection.categories,
            &selection.offered,
        );
    row_counts.after_category_filters = dataset.len();

    let classification = classify(&dataset);
    let chart = parameters::resolve_chart_parameters(selection, &classification);
    let aggregation = parameters::resolve_aggregation_parameters(selection, &classification);

    let summary = aggregation
        .group_by
        .as_deref()
        .and_then(|group_by| aggregate(&dataset, group_by, &aggregation.columns));

    tracing::debug!("Pipeline row counts: {row_counts:?}");

    Ok(RenderResult {
        dataset,
        classification,
        category_options,
        date_bounds,
        exclude_negative: selection.exclude_negative,
        chart,
        aggregation,
        summary,
        row_counts,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use time::macros::{date, datetime};

    use crate::{
        Error,
        config::{MissingAmountPolicy, PipelineConfig},
        dataset::{Dataset, Value, parse_csv},
    };

    use super::{ColumnSummary, FilterSelection, PipelineRowCounts, derive};

    const EXAMPLE_CSV: &str = "\
TransactionStartTime,Amount,type
2023-01-01,-5,A
2023-01-02,10,B
";

    const TRANSACTIONS_CSV: &str = "\
TransactionId,ChannelId,ProductCategory,Amount,Value,TransactionStartTime
T1,web,airtime,1000.0,1000,2018-11-15T02:18:49Z
T2,web,financial_services,-20.0,20,2018-11-15T02:19:08Z
T3,android,airtime,500.0,500,2018-11-16T10:00:00Z
T4,android,tv,,300,2018-11-17T09:30:00Z
T5,ios,airtime,250.0,250,not a timestamp
T6,web,tv,-50.0,50,2018-11-18T23:59:59Z
T7,ios,data_bundles,75.5,75,2018-11-19T00:00:00Z
";

    fn example_config() -> PipelineConfig {
        PipelineConfig {
            temporal_column: "TransactionStartTime".to_owned(),
            amount_column: "Amount".to_owned(),
            missing_amount: MissingAmountPolicy::Ignore,
        }
    }

    fn load(text: &str) -> Dataset {
        parse_csv(text.as_bytes()).unwrap()
    }

    fn selections(pairs: &[(&str, Vec<&str>)]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(column, values)| {
                (
                    column.to_string(),
                    values.iter().map(|value| value.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn excludes_negative_amount_row() {
        let dataset = load(EXAMPLE_CSV);
        let selection = FilterSelection {
            exclude_negative: true,
            categories: selections(&[("type", vec!["A", "B"])]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(result.dataset.len(), 1);
        assert_eq!(
            result.dataset.rows()[0],
            vec![
                Value::Timestamp(datetime!(2023-01-02 00:00:00)),
                Value::Integer(10),
                Value::Text("B".to_owned()),
            ]
        );
    }

    #[test]
    fn single_day_range_keeps_that_day_regardless_of_sign_filter() {
        let dataset = load(EXAMPLE_CSV);

        for exclude_negative in [false, true] {
            let selection = FilterSelection {
                date_range: vec![date!(2023 - 01 - 02), date!(2023 - 01 - 02)],
                exclude_negative,
                ..Default::default()
            };

            let result = derive(&dataset, &selection, &example_config()).unwrap();

            assert_eq!(result.dataset.len(), 1);
            assert_eq!(result.dataset.rows()[0][1], Value::Integer(10));
        }
    }

    #[test]
    fn summarises_example_groups() {
        let dataset = load("type,amount\nA,4\nA,6\nB,10\n");
        let selection = FilterSelection {
            group_by: Some("type".to_owned()),
            agg_columns: Some(vec!["amount".to_owned()]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();
        let summary = result.summary.unwrap();

        assert_eq!(summary.group_by, "type");
        assert_eq!(summary.columns, vec!["amount"]);
        assert_eq!(summary.groups[0].key, "A");
        assert_eq!(
            summary.groups[0].columns[0],
            ColumnSummary {
                mean: Some(5.0),
                sum: 10.0,
                count: 2
            }
        );
        assert_eq!(summary.groups[1].key, "B");
        assert_eq!(
            summary.groups[1].columns[0],
            ColumnSummary {
                mean: Some(10.0),
                sum: 10.0,
                count: 1
            }
        );
    }

    #[test]
    fn placeholder_amount_is_missing_not_text() {
        let dataset = load("type,Amount\nA,4\nA,NA\nB,10\n");
        let selection = FilterSelection {
            exclude_negative: true,
            group_by: Some("type".to_owned()),
            agg_columns: Some(vec!["Amount".to_owned()]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(result.classification.numeric, vec!["Amount"]);
        assert_eq!(result.dataset.len(), 2);
        let summary = result.summary.unwrap();
        assert_eq!(summary.groups[0].key, "A");
        assert_eq!(
            summary.groups[0].columns[0],
            ColumnSummary {
                mean: Some(4.0),
                sum: 4.0,
                count: 1
            }
        );
    }

    #[test]
    fn nan_amount_is_skipped_by_summary() {
        let dataset = load("type,Amount\nA,4\nA,NaN\nB,10\n");
        let selection = FilterSelection {
            group_by: Some("type".to_owned()),
            agg_columns: Some(vec!["Amount".to_owned()]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();
        let summary = result.summary.unwrap();

        assert_eq!(
            summary.groups[0].columns[0],
            ColumnSummary {
                mean: Some(4.0),
                sum: 4.0,
                count: 1
            }
        );
    }

    #[test]
    fn repeated_column_names_filter_independently() {
        let dataset = load("type,type,Amount\nA,X,1\nB,Y,2\n");
        let selection = FilterSelection {
            categories: selections(&[("type.1", vec!["X"])]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(result.classification.categorical, vec!["type", "type.1"]);
        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.dataset.rows()[0][0], Value::Text("A".to_owned()));
    }

    #[test]
    fn derivation_is_idempotent() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            date_range: vec![date!(2018 - 11 - 15), date!(2018 - 11 - 18)],
            exclude_negative: true,
            categories: selections(&[("ProductCategory", vec!["airtime", "tv"])]),
            ..Default::default()
        };

        let first = derive(&dataset, &selection, &example_config()).unwrap();
        let second = derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn row_counts_never_increase() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            date_range: vec![date!(2018 - 11 - 15), date!(2018 - 11 - 19)],
            exclude_negative: true,
            categories: selections(&[("ChannelId", vec!["web", "android"])]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(
            result.row_counts,
            PipelineRowCounts {
                loaded: 7,
                after_temporal_normalization: 6,
                after_date_range: 6,
                after_sign_filter: 3,
                after_category_filters: 2,
            }
        );
    }

    #[test]
    fn every_row_satisfies_every_filter() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            date_range: vec![date!(2018 - 11 - 15), date!(2018 - 11 - 17)],
            exclude_negative: true,
            categories: selections(&[
                ("ChannelId", vec!["web", "android"]),
                ("ProductCategory", vec!["airtime", "tv"]),
            ]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();
        let filtered = &result.dataset;
        let channel = filtered.column_index("ChannelId").unwrap();
        let product = filtered.column_index("ProductCategory").unwrap();
        let amount = filtered.column_index("Amount").unwrap();
        let time = filtered.column_index("TransactionStartTime").unwrap();

        assert!(!filtered.is_empty());
        for row in filtered.rows() {
            let timestamp = row[time].as_timestamp().unwrap();
            assert!(datetime!(2018-11-15 00:00:00) <= timestamp);
            assert!(timestamp <= datetime!(2018-11-17 00:00:00));
            assert!(row[amount].as_f64().unwrap() >= 0.0);
            assert!(["web", "android"].contains(&row[channel].category_key().as_str()));
            assert!(["airtime", "tv"].contains(&row[product].category_key().as_str()));
        }
    }

    #[test]
    fn classification_is_consistent() {
        let dataset = load(TRANSACTIONS_CSV);

        let result = derive(&dataset, &FilterSelection::default(), &example_config()).unwrap();
        let classification = &result.classification;

        let categorical: HashSet<_> = classification.categorical.iter().collect();
        let numeric: HashSet<_> = classification.numeric.iter().collect();
        assert!(categorical.is_disjoint(&numeric));

        for name in categorical.iter().chain(numeric.iter()) {
            let occurrences = result
                .dataset
                .columns()
                .iter()
                .filter(|column| &&column.name == name)
                .count();
            assert_eq!(occurrences, 1, "column {name}");
        }

        assert_eq!(
            classification.temporal.as_deref(),
            Some("TransactionStartTime")
        );
        assert_eq!(
            classification.categorical,
            vec!["TransactionId", "ChannelId", "ProductCategory"]
        );
        assert_eq!(classification.numeric, vec!["Amount", "Value"]);
    }

    #[test]
    fn offered_values_reflect_state_before_own_filter() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            categories: selections(&[
                ("ChannelId", vec!["ios"]),
                ("ProductCategory", vec!["data_bundles"]),
            ]),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();
        let options = &result.category_options;

        // TransactionId is declared first, so it sees every normalized row.
        assert_eq!(options[0].column, "TransactionId");
        assert_eq!(options[0].available.len(), 6);
        // ChannelId sees all rows because TransactionId kept everything.
        assert_eq!(options[1].available, vec!["web", "android", "ios"]);
        assert_eq!(options[1].selected, vec!["ios"]);
        // ProductCategory only sees the ios rows left by the channel filter.
        assert_eq!(options[2].available, vec!["data_bundles"]);
        assert_eq!(result.dataset.len(), 1);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            categories: selections(&[("ChannelId", vec![])]),
            group_by: Some("ChannelId".to_owned()),
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();

        assert!(result.dataset.is_empty());
        assert_eq!(result.chart.x.as_deref(), Some("TransactionId"));
        assert!(result.summary.unwrap().groups.is_empty());
    }

    #[test]
    fn date_bounds_come_from_normalized_rows() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            date_range: vec![date!(2018 - 11 - 16), date!(2018 - 11 - 16)],
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();
        let bounds = result.date_bounds.unwrap();

        assert_eq!(bounds.min, date!(2018 - 11 - 15));
        assert_eq!(bounds.max, date!(2018 - 11 - 19));
        // Only midnight of the 16th is inside the range, and T3 is at 10am.
        assert!(result.dataset.is_empty());
    }

    #[test]
    fn dataset_without_temporal_column_skips_date_filter() {
        let dataset = load("type,Amount\nA,-1\nB,2\n");
        let selection = FilterSelection {
            date_range: vec![date!(2023 - 01 - 01), date!(2023 - 01 - 01)],
            ..Default::default()
        };

        let result = derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(result.dataset.len(), 2);
        assert_eq!(result.date_bounds, None);
        assert_eq!(result.classification.temporal, None);
    }

    #[test]
    fn missing_amount_column_follows_policy() {
        let dataset = load("type,Value\nA,-1\nB,2\n");
        let selection = FilterSelection {
            exclude_negative: true,
            ..Default::default()
        };

        let ignored = derive(&dataset, &selection, &example_config()).unwrap();
        assert_eq!(ignored.dataset.len(), 2);

        let config = PipelineConfig {
            missing_amount: MissingAmountPolicy::Reject,
            ..example_config()
        };
        let rejected = derive(&dataset, &selection, &config);
        assert_eq!(rejected, Err(Error::MissingColumn("Amount".to_owned())));
    }

    #[test]
    fn cached_dataset_is_not_modified() {
        let dataset = load(TRANSACTIONS_CSV);
        let selection = FilterSelection {
            exclude_negative: true,
            ..Default::default()
        };

        derive(&dataset, &selection, &example_config()).unwrap();

        assert_eq!(dataset, load(TRANSACTIONS_CSV));
    }
}
