//! HTTP server for the timetable.
//!
//! Exposes feed import, manual entry and the merged event list over JSON.
//!
//! # Example
//!
//! ```rust,no_run
//! use timetable_server::{ServerConfig, SignalHandler, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default().with_port(8080);
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener()?;
//!     serve(&config, signals.shutdown()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod config;
mod error;
mod routes;
mod service;
mod signals;

use axum::Router;
use axum::http::Method;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use timetable_feed::FeedFetcher;
use timetable_store::{EventStore, SharedStore};

pub use config::{DEFAULT_HOST, DEFAULT_PORT, FetchSettings, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use service::{ImportOutcome, ImportService};
pub use signals::{ShutdownSignal, SignalHandler};

/// Builds the router with CORS and request tracing.
pub fn app(service: ImportService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    routes::router(service)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Opens the database (creating its directory) and the feed fetcher.
pub fn open_service(config: &ServerConfig) -> ServerResult<ImportService> {
    let database_path = config.database_path();
    if let Some(parent) = database_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let store = EventStore::open(&database_path)?;
    let fetcher = FeedFetcher::new(config.fetch_config())?;
    info!(path = %database_path.display(), "Opened database");

    Ok(ImportService::new(SharedStore::new(store), fetcher))
}

/// Serves the API until `shutdown` completes.
pub async fn serve(config: &ServerConfig, shutdown: ShutdownSignal) -> ServerResult<()> {
    let addr = config.socket_addr()?;
    let service = open_service(config)?;

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app(service))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    info!("Server stopped");
    Ok(())
}
