//! An interactive dashboard for exploring a transactions dataset.
//!
//! The dataset is read from a CSV file once and kept in memory. Every request
//! to the dashboard runs the [pipeline] over it with the user's filters and
//! serves the resulting charts and tables as HTML, along with a CSV export of
//! the filtered rows.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
pub mod config;
mod dashboard;
pub mod dataset;
mod endpoints;
mod error_page;
mod html;
mod logging;
mod not_found;
pub mod pipeline;
mod routing;

pub use app_state::AppState;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

use crate::error_page::ErrorPage;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The dataset could not be read or parsed.
    ///
    /// Nothing can be shown without the dataset, so this error replaces the
    /// whole dashboard.
    #[error("the dataset is unavailable: {0}")]
    DataUnavailable(String),

    /// Negative amounts should be excluded but the named amount column is
    /// missing or not numeric, and the pipeline is configured to reject that.
    #[error("the column \"{0}\" does not exist or is not numeric")]
    MissingColumn(String),

    /// The filter selection in the request could not be parsed.
    #[error("invalid filter selection: {0}")]
    InvalidSelection(String),

    /// Could not acquire the lock on the cached dataset.
    #[error("could not acquire the dataset lock")]
    DatasetLockError,

    /// The filtered dataset could not be written as CSV.
    #[error("could not export the filtered data as CSV: {0}")]
    CsvExportError(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::DataUnavailable(_) => ErrorPage {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                description: "Data Unavailable",
                fix: "The transactions dataset could not be loaded. Check that the CSV file \
                    exists and is valid, then reload the data or restart the server.",
            }
            .into_response(),
            Error::MissingColumn(column) => ErrorPage {
                status: StatusCode::BAD_REQUEST,
                description: "Missing Amount Column",
                fix: &format!(
                    "Negative amounts cannot be excluded because the dataset has no numeric \
                    \"{column}\" column. Untick \"Exclude negative amounts\" and try again."
                ),
            }
            .into_response(),
            Error::InvalidSelection(reason) => ErrorPage {
                status: StatusCode::BAD_REQUEST,
                description: "Invalid Filters",
                fix: &format!("The dashboard filters could not be read: {reason}."),
            }
            .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                ErrorPage::internal_server_error().into_response()
            }
        }
    }
}
