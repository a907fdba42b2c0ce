use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use transactions_dashboard::{
    AppState, build_router,
    config::{
        DEFAULT_AMOUNT_COLUMN, DEFAULT_PREVIEW_ROWS, DEFAULT_TEMPORAL_COLUMN, DashboardConfig,
        MissingAmountPolicy, PipelineConfig,
    },
    dataset::CsvFileSource,
    graceful_shutdown, logging_middleware,
};

/// The web server for the transactions dashboard.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the transactions CSV file.
    #[arg(long, default_value = "Transactions_data.csv")]
    data_path: PathBuf,

    /// The port to serve the dashboard from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The name of the column holding transaction timestamps.
    #[arg(long, default_value = DEFAULT_TEMPORAL_COLUMN)]
    temporal_column: String,

    /// The name of the column checked when excluding negative amounts.
    #[arg(long, default_value = DEFAULT_AMOUNT_COLUMN)]
    amount_column: String,

    /// What to do when negative amounts should be excluded but the amount column is missing.
    #[arg(long, value_enum, default_value_t = MissingAmountPolicy::Ignore)]
    missing_amount: MissingAmountPolicy,

    /// The maximum number of filtered rows shown in the table preview.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let state = AppState::new(
        CsvFileSource::new(&args.data_path),
        PipelineConfig {
            temporal_column: args.temporal_column,
            amount_column: args.amount_column,
            missing_amount: args.missing_amount,
        },
        DashboardConfig {
            preview_rows: args.preview_rows,
        },
    );

    // Load the data up front so problems show up in the logs straight away.
    // The dashboard shows an error page and retries on the next request if this fails.
    match state.dataset_cache.get() {
        Ok(dataset) => tracing::info!(
            "Loaded {} rows from {}",
            dataset.len(),
            args.data_path.display()
        ),
        Err(error) => tracing::error!("Could not load {}: {error}", args.data_path.display()),
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
