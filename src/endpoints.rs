//! The endpoint URIs.

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The dashboard page. Requests made by htmx get only the dashboard content.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The rows left by the dashboard filters as a CSV download.
pub const DASHBOARD_EXPORT: &str = "/dashboard/export.csv";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The filtered dashboard data (everything but the rows) as JSON.
pub const DASHBOARD_API: &str = "/api/dashboard";
/// The route for reloading the dataset from its source.
pub const RELOAD_API: &str = "/api/reload";
