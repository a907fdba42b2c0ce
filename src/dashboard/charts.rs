//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations of the filtered rows:
//! - **Time series**: mean of the Y column per timestamp
//! - **Histogram**: distribution of the Y column, optionally stacked by the color column
//! - **Category means**: mean of the Y column per value of the X column
//! - **Correlation heatmap**: Pearson correlation between the numeric columns
//! - **Category share**: rows per value of the X column
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title, VisualMap},
    datatype::{CompositeValue, DataFrame},
    element::{
        AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, Label, Orient, Tooltip,
        Trigger,
    },
    series::{Bar, Heatmap, Line, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{
    dashboard::aggregation::{
        category_counts, correlation_matrix, histogram, mean_by_category, mean_by_timestamp,
    },
    dataset::Dataset,
    pipeline::{ChartParameters, round_to_cents},
};

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Builds every dashboard chart for the filtered `dataset`.
///
/// Charts whose columns are not available are still returned, without data,
/// so the layout does not jump around as filters change.
pub(super) fn build_dashboard_charts(
    dataset: &Dataset,
    temporal_column: Option<&str>,
    parameters: &ChartParameters,
    numeric_columns: &[String],
) -> Vec<DashboardChart> {
    let x = parameters.x.as_deref();
    let y = parameters.y.as_deref();
    let color = parameters.color.as_deref();

    let mut charts = Vec::with_capacity(5);

    if let Some(temporal_column) = temporal_column {
        charts.push(DashboardChart {
            id: "time-series-chart",
            options: time_series_chart(dataset, temporal_column, y).to_string(),
        });
    }

    charts.extend([
        DashboardChart {
            id: "histogram-chart",
            options: histogram_chart(dataset, y, color).to_string(),
        },
        DashboardChart {
            id: "category-mean-chart",
            options: category_mean_chart(dataset, x, y).to_string(),
        },
        DashboardChart {
            id: "correlation-chart",
            options: correlation_chart(dataset, numeric_columns).to_string(),
        },
        DashboardChart {
            id: "category-share-chart",
            options: category_share_chart(dataset, x).to_string(),
        },
    ]);

    charts
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// The script runs immediately, so it must be placed after the chart
/// containers. This lets the same script run on page load and when htmx
/// swaps in new dashboard content.
pub(super) fn charts_script(charts: &[DashboardChart]) -> Markup {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    echarts.getInstanceByDom(chartDom)?.dispose();
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    html!(script { (PreEscaped(script_content)) })
}

fn time_series_chart(dataset: &Dataset, temporal_column: &str, y: Option<&str>) -> Chart {
    let Some(y) = y else {
        return empty_chart("Over time", "No numeric column to plot");
    };

    let (labels, values) = mean_by_timestamp(dataset, temporal_column, y);
    let values = with_gaps(values);

    Chart::new()
        .title(
            Title::new()
                .text(format!("Mean {y} over time"))
                .subtext(format!("By {temporal_column}")),
        )
        .tooltip(axis_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Line::new().name(y).data(values))
}

fn histogram_chart(dataset: &Dataset, y: Option<&str>, color: Option<&str>) -> Chart {
    let Some(y) = y else {
        return empty_chart("Distribution", "No numeric column to plot");
    };

    let histogram = histogram(dataset, y, color);

    let subtext = match color {
        Some(color) => format!("Split by {color}"),
        None => "All rows".to_owned(),
    };

    let mut chart = Chart::new()
        .title(
            Title::new()
                .text(format!("Distribution of {y}"))
                .subtext(subtext)
                .left(20)
                .top("1%"),
        )
        .tooltip(axis_tooltip())
        .grid(default_grid().top(90))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(histogram.labels),
        )
        .y_axis(Axis::new().type_(AxisType::Value).name("Count"));

    if color.is_some() {
        chart = chart.legend(Legend::new().left(250).top("1%"));
    }

    for (group, counts) in histogram.series {
        chart = chart.series(
            Bar::new()
                .name(category_label(&group))
                .stack("count")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(counts),
        );
    }

    chart
}

fn category_mean_chart(dataset: &Dataset, x: Option<&str>, y: Option<&str>) -> Chart {
    let (Some(x), Some(y)) = (x, y) else {
        return empty_chart("Mean by category", "Needs a categorical and a numeric column");
    };

    let (labels, values) = mean_by_category(dataset, x, y);
    let labels: Vec<String> = labels.iter().map(|label| category_label(label)).collect();
    let values = with_gaps(values);

    Chart::new()
        .title(Title::new().text(format!("Mean {y} by {x}")))
        .tooltip(axis_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Bar::new().name(y).data(values))
}

fn correlation_chart(dataset: &Dataset, numeric_columns: &[String]) -> Chart {
    if numeric_columns.is_empty() {
        return empty_chart("Correlation", "No numeric columns");
    }

    let matrix = correlation_matrix(dataset, numeric_columns);

    // ECharts heatmap cells are [x index, y index, value].
    let mut cells: Vec<DataFrame> = Vec::new();
    for (row, correlations) in matrix.iter().enumerate() {
        for (column, correlation) in correlations.iter().enumerate() {
            if let Some(correlation) = correlation {
                cells.push(vec![
                    (column as f64).into(),
                    (row as f64).into(),
                    round_to_cents(*correlation).into(),
                ]);
            }
        }
    }

    Chart::new()
        .title(Title::new().text("Correlation").subtext("Pearson, numeric columns"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .grid(default_grid().bottom("15%"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(numeric_columns.to_vec()),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(numeric_columns.to_vec()),
        )
        .visual_map(
            VisualMap::new()
                .min(-1.0)
                .max(1.0)
                .calculable(true)
                .orient(Orient::Horizontal)
                .left("center")
                .bottom("0%"),
        )
        .series(
            Heatmap::new()
                .name("Correlation")
                .label(Label::new().show(true))
                .data(cells),
        )
}

fn category_share_chart(dataset: &Dataset, x: Option<&str>) -> Chart {
    let Some(x) = x else {
        return empty_chart("Share by category", "No categorical column to plot");
    };

    let counts: Vec<(f64, String)> = category_counts(dataset, x)
        .into_iter()
        .map(|(category, count)| (count, category_label(&category)))
        .collect();

    Chart::new()
        .title(Title::new().text(format!("Rows by {x}")))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().orient(Orient::Vertical).left("left").top("15%"))
        .series(Pie::new().name(x).radius("60%").data(counts))
}

/// A chart with only a title, for when its columns are not available.
fn empty_chart(title: &str, subtext: &str) -> Chart {
    Chart::new().title(Title::new().text(title).subtext(subtext))
}

/// Missing categories are grouped under the empty string, which makes for a poor label.
fn category_label(category: &str) -> String {
    if category.is_empty() {
        "(missing)".to_owned()
    } else {
        category.to_owned()
    }
}

/// Rounds each value to cents, with missing values as "-" which ECharts draws as a gap.
fn with_gaps(values: Vec<Option<f64>>) -> Vec<CompositeValue> {
    values
        .into_iter()
        .map(|value| match value {
            Some(value) => round_to_cents(value).into(),
            None => "-".into(),
        })
        .collect()
}

fn default_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

fn axis_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}

#[cfg(test)]
mod tests {
    use crate::{
        dataset::{Dataset, parse_csv},
        pipeline::ChartParameters,
    };

    use super::{DashboardChart, build_dashboard_charts, category_label, charts_script};

    fn get_test_dataset() -> Dataset {
        parse_csv("channel,Amount\nweb,10\napp,-5\n".as_bytes()).unwrap()
    }

    fn ids(charts: &[DashboardChart]) -> Vec<&str> {
        charts.iter().map(|chart| chart.id).collect()
    }

    #[test]
    fn builds_time_series_only_with_temporal_column() {
        let dataset = get_test_dataset();
        let parameters = ChartParameters {
            x: Some("channel".to_owned()),
            y: Some("Amount".to_owned()),
            color: None,
        };
        let numeric = vec!["Amount".to_owned()];

        let without = build_dashboard_charts(&dataset, None, &parameters, &numeric);
        let with = build_dashboard_charts(&dataset, Some("Time"), &parameters, &numeric);

        assert_eq!(
            ids(&without),
            vec![
                "histogram-chart",
                "category-mean-chart",
                "correlation-chart",
                "category-share-chart"
            ]
        );
        assert_eq!(with.len(), 5);
        assert_eq!(with[0].id, "time-series-chart");
    }

    #[test]
    fn chart_options_name_selected_columns() {
        let dataset = get_test_dataset();
        let parameters = ChartParameters {
            x: Some("channel".to_owned()),
            y: Some("Amount".to_owned()),
            color: Some("channel".to_owned()),
        };

        let charts = build_dashboard_charts(&dataset, None, &parameters, &["Amount".to_owned()]);

        let category_mean = &charts[1].options;
        assert!(category_mean.contains("Mean Amount by channel"), "{category_mean}");
        assert!(category_mean.contains("\"web\""));
        let histogram = &charts[0].options;
        assert!(histogram.contains("Split by channel"), "{histogram}");
    }

    #[test]
    fn charts_without_columns_have_placeholder_titles() {
        let dataset = Dataset::default();

        let charts = build_dashboard_charts(&dataset, None, &ChartParameters::default(), &[]);

        assert_eq!(charts.len(), 4);
        assert!(charts[0].options.contains("No numeric column to plot"));
        assert!(charts[3].options.contains("No categorical column to plot"));
    }

    #[test]
    fn script_initialises_every_chart() {
        let charts = vec![
            DashboardChart {
                id: "a-chart",
                options: "{}".to_owned(),
            },
            DashboardChart {
                id: "b-chart",
                options: "{}".to_owned(),
            },
        ];

        let script = charts_script(&charts).into_string();

        assert!(script.starts_with("<script>"));
        assert!(script.contains("document.getElementById(\"a-chart\")"));
        assert!(script.contains("document.getElementById(\"b-chart\")"));
    }

    #[test]
    fn missing_category_has_readable_label() {
        assert_eq!(category_label(""), "(missing)");
        assert_eq!(category_label("web"), "web");
    }
}
