//! Dashboard module
//!
//! Provides the page for exploring the transactions dataset: filter controls,
//! charts, a grouped summary and previews of the loaded and filtered rows.

mod aggregation;
mod charts;
mod handlers;
mod tables;
mod widgets;

pub use handlers::{
    get_dashboard_export, get_dashboard_json, get_dashboard_page, post_reload_dataset,
};
