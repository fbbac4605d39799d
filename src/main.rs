//! CivicPulse - a civic complaint reporting and official accountability
//! platform.
//!
//! Process entry point: read configuration from the environment, open the
//! store, and serve the API. The routes live in [`civicpulse::api::router`].

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use civicpulse::api::{self, AppState};
use civicpulse::storage::Storage;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:civicpulse.db?mode=rwc";

/// Default token-signing secret, matching the original deployment default.
/// Override with CIVICPULSE_JWT_SECRET in any real deployment.
const DEFAULT_JWT_SECRET: &str = "civicpulse_secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("civicpulse=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("CIVICPULSE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url =
        env::var("CIVICPULSE_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let jwt_secret =
        env::var("CIVICPULSE_JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());

    info!(port, db_url = %db_url, "Starting CivicPulse server");

    // Initialize storage
    let storage = Storage::new(&db_url).await?;
    info!("Database initialized");

    // Create application state and router
    let state = AppState {
        storage,
        jwt_secret,
    };
    let app = api::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "CivicPulse is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
