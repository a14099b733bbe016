use std::{fs::OpenOptions, net::SocketAddr, path::Path, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use ledger_rs::{
    PasswordHash, build_router, create_app_state, graceful_shutdown, logging_middleware,
};

/// The REST API server for ledger_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The bcrypt cost used when hashing new passwords.
    #[arg(long, default_value_t = PasswordHash::DEFAULT_COST)]
    bcrypt_cost: u32,

    /// File path that debug logs are appended to.
    #[arg(long, default_value = "debug.log")]
    log_path: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(Path::new(&args.log_path));

    let conn = Connection::open(&args.db_path).expect("Could not open the ledger database.");
    let state = create_app_state(conn, args.bcrypt_cost)
        .expect("Could not create the ledger tables.");

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_request_spans(router);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("Ledger API listening on http://{addr}");

    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The ledger server stopped unexpectedly.");
}

/// Log to stdout and to the file at `log_path`.
///
/// Stdout shows `info` and above unless `RUST_LOG` says otherwise. The file
/// always gets `debug` and above, which includes full request bodies.
fn setup_logging(log_path: &Path) {
    let console_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let console_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(console_filter);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .unwrap_or_else(|error| panic!("Could not open the log file {log_path:?}: {error}"));
    let file_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console_log)
        .with(file_log)
        .init();
}

/// Wrap each request in a span named after the route it matched.
fn add_request_spans(router: Router) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str)
                .unwrap_or("unmatched");

            tracing::debug_span!(
                "ledger_request",
                method = %request.method(),
                uri = %request.uri(),
                route,
            )
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(trace_layer)
}
