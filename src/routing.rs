//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    dashboard::{
        get_dashboard_export, get_dashboard_json, get_dashboard_page, post_reload_dataset,
    },
    endpoints,
    error_page::get_internal_server_error_page,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::DASHBOARD_EXPORT, get(get_dashboard_export))
        .route(endpoints::DASHBOARD_API, get(get_dashboard_json))
        .route(endpoints::RELOAD_API, post(post_reload_dataset))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        )
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use crate::{
        AppState, Error,
        config::{DashboardConfig, PipelineConfig},
        dataset::{DataSource, Dataset, parse_csv},
        endpoints,
    };

    use super::build_router;

    struct StaticSource;

    impl DataSource for StaticSource {
        fn load(&self) -> Result<Dataset, Error> {
            parse_csv(
                "ChannelId,Amount,TransactionStartTime\n\
                web,10.0,2018-11-15T02:18:49Z\n\
                ios,-5.0,2018-11-16T02:18:49Z\n"
                    .as_bytes(),
            )
        }

        fn describe(&self) -> String {
            "test data".to_owned()
        }
    }

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            StaticSource,
            PipelineConfig::default(),
            DashboardConfig::default(),
        );

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let server = get_test_server();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn dashboard_route_serves_page() {
        let server = get_test_server();

        let response = server.get(endpoints::DASHBOARD_VIEW).await;

        response.assert_status_ok();
        assert!(response.text().contains("Transactions Dashboard"));
    }

    #[tokio::test]
    async fn dashboard_route_serves_partial_to_htmx() {
        let server = get_test_server();

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_query_param("exclude_negative", "on")
            .add_header("HX-Request", "true")
            .await;

        response.assert_status_ok();
        let text = response.text();
        assert!(!text.contains("<html"));
        assert!(text.contains("dashboard-filters"));
    }

    #[tokio::test]
    async fn export_route_serves_csv() {
        let server = get_test_server();

        let response = server
            .get(endpoints::DASHBOARD_EXPORT)
            .add_query_param("exclude_negative", "on")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "text/csv; charset=utf-8");
        assert_eq!(
            response.text(),
            "ChannelId,Amount,TransactionStartTime\nweb,10.0,2018-11-15 02:18:49\n"
        );
    }

    #[tokio::test]
    async fn api_route_serves_json() {
        let server = get_test_server();

        let response = server.get(endpoints::DASHBOARD_API).await;

        response.assert_status_ok();
        let value = response.json::<serde_json::Value>();
        assert_eq!(value["row_counts"]["after_category_filters"], 2);
        assert_eq!(value["date_bounds"]["min"], "2018-11-15");
    }

    #[tokio::test]
    async fn invalid_query_is_bad_request() {
        let server = get_test_server();

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_query_param("date_end", "not a date")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reload_route_redirects_htmx() {
        let server = get_test_server();

        let response = server.post(endpoints::RELOAD_API).await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/definitely/not/a/page")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn error_route_serves_error_page() {
        let server = get_test_server();

        server
            .get(endpoints::INTERNAL_ERROR_VIEW)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}
