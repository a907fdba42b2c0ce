//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for the dashboard page, its CSV export, its JSON API and reloading the data
//! - HTML view functions for rendering the dashboard UI
//! - The state used by the handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, RawQuery, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    config::{DashboardConfig, PipelineConfig},
    dashboard::{
        charts::{DashboardChart, build_dashboard_charts, charts_script, charts_view},
        tables::{aggregation_table, dataset_table, diagnostics_table},
        widgets::filter_form,
    },
    dataset::{Dataset, DatasetCache, write_csv},
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, HeadElement, PAGE_CONTAINER_STYLE, base, link},
    pipeline::{FilterSelection, RenderResult, derive},
};

/// The number of loaded rows shown above the filtered rows.
const LOADED_PREVIEW_ROWS: usize = 5;

/// The file name suggested for the CSV export.
const EXPORT_FILE_NAME: &str = "transactions_filtered.csv";

const ECHARTS_SCRIPT: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The loaded dataset.
    pub dataset_cache: Arc<DatasetCache>,
    /// The column names and policies the pipeline runs with.
    pub pipeline_config: PipelineConfig,
    /// How much data the page displays.
    pub dashboard_config: DashboardConfig,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            dataset_cache: state.dataset_cache.clone(),
            pipeline_config: state.pipeline_config.clone(),
            dashboard_config: state.dashboard_config,
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    /// The dataset as it was loaded, before any filter.
    loaded: Arc<Dataset>,
    selection: FilterSelection,
    result: RenderResult,
}

/// Display the dashboard with the filters in the query string applied.
///
/// Requests made by htmx get only the dashboard content so it can be swapped
/// into the page that is already displayed.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    HxRequest(is_htmx_request): HxRequest,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let query = query.unwrap_or_default();
    let data = build_dashboard_data(&state, &query)?;
    let charts = build_charts(&data.result);

    let content = dashboard_content(&data, &charts, &query, &state.dashboard_config);

    if is_htmx_request {
        Ok(content.into_response())
    } else {
        Ok(dashboard_view(&content).into_response())
    }
}

/// Download the rows that pass the filters in the query string as a CSV file.
pub async fn get_dashboard_export(
    State(state): State<DashboardState>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let data = build_dashboard_data(&state, &query.unwrap_or_default())?;

    let csv = write_csv(&data.result.dataset)
        .inspect_err(|error| tracing::error!("could not export filtered rows: {error}"))?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Get the derived dashboard data for the filters in the query string as JSON.
///
/// The filtered rows themselves are left out, use the CSV export for those.
pub async fn get_dashboard_json(
    State(state): State<DashboardState>,
    RawQuery(query): RawQuery,
) -> Result<Json<RenderResult>, Error> {
    let data = build_dashboard_data(&state, &query.unwrap_or_default())?;

    Ok(Json(data.result))
}

/// Reload the dataset from its source and send the client back to the dashboard.
///
/// If the reload fails, the previously loaded dataset stays in use.
pub async fn post_reload_dataset(State(state): State<DashboardState>) -> Response {
    match state.dataset_cache.reload() {
        Ok(dataset) => {
            tracing::info!("Reloaded dataset with {} rows", dataset.len());

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::OK,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not reload dataset: {error}");
            error.into_response()
        }
    }
}

/// Loads the dataset and runs the pipeline with the selection in `query`.
///
/// # Errors
/// Returns an error if the query cannot be parsed, the dataset cannot be
/// loaded, or the pipeline rejects the selection.
fn build_dashboard_data(state: &DashboardState, query: &str) -> Result<DashboardData, Error> {
    let selection = FilterSelection::from_query(query)
        .inspect_err(|error| tracing::warn!("could not parse dashboard query {query:?}: {error}"))?;

    let loaded = state
        .dataset_cache
        .get()
        .inspect_err(|error| tracing::error!("could not load dataset: {error}"))?;

    let result = derive(&loaded, &selection, &state.pipeline_config)
        .inspect_err(|error| tracing::warn!("could not apply dashboard filters: {error}"))?;

    Ok(DashboardData {
        loaded,
        selection,
        result,
    })
}

fn build_charts(result: &RenderResult) -> Vec<DashboardChart> {
    build_dashboard_charts(
        &result.dataset,
        result.classification.temporal.as_deref(),
        &result.chart,
        &result.classification.numeric,
    )
}

/// Renders the full dashboard page around `content`.
fn dashboard_view(content: &Markup) -> Markup {
    let content = html!(
        div class=(PAGE_CONTAINER_STYLE)
        {
            header class="flex flex-wrap items-center justify-between gap-4 w-full max-w-screen-2xl mb-4"
            {
                h1 class="text-2xl font-bold" { "Transactions Dashboard" }

                button
                    type="button"
                    hx-post=(endpoints::RELOAD_API)
                    hx-target-error="#dashboard-content"
                    class={(BUTTON_SECONDARY_STYLE) " max-w-48"}
                {
                    "Reload data"
                }
            }

            div
                id="dashboard-content"
                class="flex flex-col lg:flex-row gap-6 w-full max-w-screen-2xl"
            {
                (content)
            }
        }
    );

    let scripts = [HeadElement::ScriptLink(ECHARTS_SCRIPT.to_owned())];

    base("Dashboard", &scripts, &content)
}

/// Renders the dashboard controls, charts and tables.
///
/// This is the part of the page that is swapped out when the filters change.
fn dashboard_content(
    data: &DashboardData,
    charts: &[DashboardChart],
    query: &str,
    config: &DashboardConfig,
) -> Markup {
    let result = &data.result;
    let export_url = if query.is_empty() {
        endpoints::DASHBOARD_EXPORT.to_owned()
    } else {
        format!("{}?{query}", endpoints::DASHBOARD_EXPORT)
    };

    html!(
        aside class="w-full lg:w-80 shrink-0"
        {
            (filter_form(&data.selection, result))
        }

        div class="flex flex-col gap-8 w-full min-w-0"
        {
            (dataset_table("loaded-preview", "Loaded Data", &data.loaded, LOADED_PREVIEW_ROWS))

            @if result.dataset.is_empty() {
                p id="no-rows" class="text-lg font-semibold"
                {
                    "No rows match the current filters."
                }
            }

            (charts_view(charts))

            (aggregation_table(result.summary.as_ref()))

            div
            {
                (dataset_table("filtered-preview", "Filtered Data", &result.dataset, config.preview_rows))

                p class="mt-2"
                {
                    (link(&export_url, "Download the filtered rows as CSV"))
                }
            }

            (diagnostics_table(&result.classification, &result.row_counts))
        }

        (charts_script(charts))
    )
}
