use credit_portal::config::Config;
use credit_portal::handlers::AppState;
use credit_portal::{obs, routes};
use std::net::SocketAddr;
use std::sync::Arc;

/// Main entry point for the application.
///
/// Loads configuration, builds the upstream client, session store and
/// reference lists, then serves the router until the process is stopped.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obs::init_tracing();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let port = config.port;
    let state = AppState::new(config)?;
    tracing::info!(
        "✓ Upstream client initialized: {}",
        state.config.customers_api_url
    );

    let app = routes::router(Arc::new(state), true);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Peer addresses feed the per-IP rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
