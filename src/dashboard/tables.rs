//! Table views for dashboard data display.
//!
//! Provides HTML tables for the grouped summary, previews of the loaded and
//! filtered rows, and the pipeline diagnostics.

use maud::{Markup, html};

use crate::{
    dataset::Dataset,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_number},
    pipeline::{AggregationTable, ColumnClassification, PipelineRowCounts},
};

const TABLE_HEADER_CELL_STYLE: &str = "px-3 py-3 text-center min-w-[100px]";
const TABLE_HEADER_FIRST_CELL_STYLE: &str =
    "px-3 py-3 sticky left-0 bg-gray-100 dark:bg-gray-700 z-10 font-semibold";
const TABLE_STICKY_CELL_STYLE: &str = "px-3 py-4 font-medium text-gray-900 dark:text-white sticky left-0 bg-white dark:bg-gray-800 z-10";
const TABLE_DATA_CELL_STYLE: &str = "text-center whitespace-nowrap";
const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";
const TABLE_CONTAINER_STYLE: &str = "overflow-x-auto rounded-lg shadow";

/// Renders the grouped summary with mean, sum and count columns per aggregated column.
///
/// # Arguments
/// * `summary` - The grouped summary, `None` if there was nothing to group or aggregate
pub(super) fn aggregation_table(summary: Option<&AggregationTable>) -> Markup {
    let Some(summary) = summary else {
        return html! {
            div id="aggregation-table" {
                h3 class="text-xl font-semibold mb-4" { "Grouped Summary" }
                p class="text-gray-600 dark:text-gray-400" {
                    "Choose a column to group by and at least one numeric column to aggregate."
                }
            }
        };
    };

    html! {
        div id="aggregation-table" {
            h3 class="text-xl font-semibold mb-4" { "Grouped Summary by " (summary.group_by) }

            div class=(TABLE_CONTAINER_STYLE) {
                table class=(TABLE_STYLE) {
                    thead class="text-xs text-gray-900 uppercase bg-gray-100 dark:bg-gray-700 dark:text-gray-400" {
                        tr {
                            th scope="col" rowspan="2" class={(TABLE_HEADER_FIRST_CELL_STYLE) " text-left"} {
                                (summary.group_by)
                            }
                            @for column in &summary.columns {
                                th scope="colgroup" colspan="3" class={(TABLE_HEADER_CELL_STYLE) " font-bold"} {
                                    (column)
                                }
                            }
                        }
                        tr {
                            @for _ in &summary.columns {
                                th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Mean" }
                                th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Sum" }
                                th scope="col" class=(TABLE_HEADER_CELL_STYLE) { "Count" }
                            }
                        }
                    }
                    tbody {
                        @for group in &summary.groups {
                            tr class=(TABLE_ROW_STYLE) {
                                th scope="row" class={(TABLE_STICKY_CELL_STYLE) " text-left"} {
                                    (group.key)
                                }
                                @for column in &group.columns {
                                    td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE)} {
                                        @match column.mean {
                                            Some(mean) => { (format_number(mean)) }
                                            None => { "-" }
                                        }
                                    }
                                    td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE)} {
                                        (format_number(column.sum))
                                    }
                                    td class={(TABLE_CELL_STYLE) " " (TABLE_DATA_CELL_STYLE)} {
                                        (column.count)
                                    }
                                }
                            }
                        }

                        @if summary.groups.is_empty() {
                            tr class=(TABLE_ROW_STYLE) {
                                td
                                    colspan=(summary.columns.len() * 3 + 1)
                                    class={(TABLE_CELL_STYLE) " text-center"}
                                {
                                    "No rows match the current filters."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the first `limit` rows of `dataset` as a table.
///
/// # Arguments
/// * `id` - The HTML element ID of the table's container
/// * `title` - The heading shown above the table
/// * `dataset` - The rows to show
/// * `limit` - The maximum number of rows to show
pub(super) fn dataset_table(id: &str, title: &str, dataset: &Dataset, limit: usize) -> Markup {
    let shown = dataset.len().min(limit);

    html! {
        div id=(id) {
            h3 class="text-xl font-semibold mb-2" { (title) }
            p class="text-sm text-gray-600 dark:text-gray-400 mb-4" {
                "Showing " (shown) " of " (dataset.len()) " rows."
            }

            div class=(TABLE_CONTAINER_STYLE) {
                table class=(TABLE_STYLE) {
                    thead class=(TABLE_HEADER_STYLE) {
                        tr {
                            @for column in dataset.columns() {
                                th scope="col" class="px-3 py-3 whitespace-nowrap" { (column.name) }
                            }
                        }
                    }
                    tbody {
                        @for row in dataset.rows().iter().take(limit) {
                            tr class=(TABLE_ROW_STYLE) {
                                @for value in row {
                                    td class="px-3 py-2 whitespace-nowrap" { (value) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the detected column kinds and the number of rows left after each pipeline step.
pub(super) fn diagnostics_table(
    classification: &ColumnClassification,
    row_counts: &PipelineRowCounts,
) -> Markup {
    let steps = [
        ("Loaded", row_counts.loaded),
        (
            "Valid timestamps",
            row_counts.after_temporal_normalization,
        ),
        ("In date range", row_counts.after_date_range),
        ("After amount sign filter", row_counts.after_sign_filter),
        ("After category filters", row_counts.after_category_filters),
    ];

    html! {
        div id="diagnostics" {
            h3 class="text-xl font-semibold mb-4" { "Diagnostics" }

            dl class="mb-4 text-sm" {
                dt class="font-semibold" { "Temporal column" }
                dd class="mb-2" {
                    (classification.temporal.as_deref().unwrap_or("None"))
                }
                dt class="font-semibold" { "Categorical columns" }
                dd class="mb-2" { (column_list(&classification.categorical)) }
                dt class="font-semibold" { "Numeric columns" }
                dd class="mb-2" { (column_list(&classification.numeric)) }
            }

            div class=(TABLE_CONTAINER_STYLE) {
                table class=(TABLE_STYLE) {
                    thead class=(TABLE_HEADER_STYLE) {
                        tr {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Step" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Rows" }
                        }
                    }
                    tbody {
                        @for (step, count) in steps {
                            tr class=(TABLE_ROW_STYLE) {
                                th scope="row" class=(TABLE_CELL_STYLE) { (step) }
                                td class=(TABLE_CELL_STYLE) { (count) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn column_list(columns: &[String]) -> String {
    if columns.is_empty() {
        "None".to_owned()
    } else {
        columns.join(", ")
    }
}
