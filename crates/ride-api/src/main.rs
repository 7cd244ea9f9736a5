//! # ride-api — Binary Entry Point
//!
//! Starts the ride lifecycle HTTP service. Configuration comes from the
//! environment (see [`AppConfig::from_env`]).

use ride_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("configuration error: {e}");
        e
    })?;
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; bearer secrets are not checked");
    }
    tracing::info!(?config, "configuration loaded");

    let port = config.port;
    let app = ride_api::app(AppState::with_config(config));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("ride API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
