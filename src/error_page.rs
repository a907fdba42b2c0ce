//! Defines the page to display when a request fails and its route handler.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct ErrorPage<'a> {
    pub status: StatusCode,
    pub description: &'a str,
    pub fix: &'a str,
}

impl ErrorPage<'_> {
    /// The generic page for errors that are not the client's fault.
    pub fn internal_server_error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }

    pub fn into_html(self) -> Html<String> {
        let title = self.status.canonical_reason().unwrap_or("Error");

        Html(error_view(title, self.status.as_str(), self.description, self.fix).into_string())
    }
}

impl IntoResponse for ErrorPage<'_> {
    fn into_response(self) -> Response {
        let status = self.status;

        (status, self.into_html()).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    ErrorPage::internal_server_error().into_response()
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::{Html, Selector};

    use super::ErrorPage;

    #[tokio::test]
    async fn renders_status_and_fix() {
        let response = ErrorPage {
            status: StatusCode::BAD_REQUEST,
            description: "Invalid Filters",
            fix: "Check the dates.",
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = Html::parse_document(&String::from_utf8_lossy(&body));
        let header = html
            .select(&Selector::parse("h1").unwrap())
            .next()
            .expect("error page should have a header");

        assert_eq!(header.text().collect::<String>().trim(), "400");
        assert!(html.html().contains("Check the dates."));
    }
}
