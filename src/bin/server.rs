use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

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

use transaction_dashboard::{
    AppState, FileSessionStore, HttpTransactionClient, PaginationConfig, SessionManager,
    build_router, graceful_shutdown, logging_middleware,
};

/// The web dashboard for the transaction service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The base URL of the transaction service, e.g. "http://localhost:5000/api".
    #[arg(long, env = "TRANSACTIONS_API_URL")]
    api_url: String,

    /// The port to serve the dashboard from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// File path to the JSON file that keeps the log-in session between restarts.
    #[arg(long, env = "SESSION_PATH", default_value = "session.json")]
    session_path: PathBuf,

    /// The canonical timezone name used to decide what "today" is, e.g. "Asia/Kolkata".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// Minutes without activity before the user is logged out.
    #[arg(long, env = "INACTIVITY_MINUTES", default_value_t = 10)]
    inactivity_minutes: u64,

    /// Seconds to wait for the transaction service before giving up on a request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// The Google OAuth client ID for the sign-in button on the log-in page.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    google_client_id: Option<String>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let session = SessionManager::init(
        FileSessionStore::new(&args.session_path),
        Duration::from_secs(args.inactivity_minutes * 60),
    );

    let client = HttpTransactionClient::new(
        &args.api_url,
        session.token_source(),
        Duration::from_secs(args.request_timeout_secs),
    )
    .expect("Could not create the transaction service client");

    let app_state = AppState::new(
        session.clone(),
        Arc::new(client),
        &args.timezone,
        PaginationConfig::default(),
        args.google_client_id,
    )
    .unwrap_or_else(|error| panic!("Could not start the server: {error}"));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!(
        "HTTP server listening on {} using the transaction service at {}",
        addr,
        args.api_url
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly");

    session.teardown();
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
        // Errors are logged where they are handled.
        .on_failure(());

    router.layer(tracing_layer)
}
