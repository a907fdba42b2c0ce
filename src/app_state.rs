//! Implements a struct that holds the state of the server.

use std::sync::Arc;

use crate::{
    config::{DashboardConfig, PipelineConfig},
    dataset::{DataSource, DatasetCache},
};

/// The state of the server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The dataset, loaded once and shared by every request.
    pub dataset_cache: Arc<DatasetCache>,

    /// The column names and policies the pipeline runs with.
    pub pipeline_config: PipelineConfig,

    /// The config that controls how much data the dashboard displays.
    pub dashboard_config: DashboardConfig,
}

impl AppState {
    /// Create a new [AppState] that reads its dataset from `source`.
    ///
    /// The dataset is not loaded until the first request for it.
    pub fn new(
        source: impl DataSource + 'static,
        pipeline_config: PipelineConfig,
        dashboard_config: DashboardConfig,
    ) -> Self {
        Self {
            dataset_cache: Arc::new(DatasetCache::new(source)),
            pipeline_config,
            dashboard_config,
        }
    }
}
