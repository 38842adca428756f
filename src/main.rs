//! Hearsay Relay Server
//!
//! Run with: cargo run --bin hearsay-server
//!
//! # Configuration
//!
//! Environment variables:
//! - `HEARSAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `HEARSAY_PORT` (or `PORT`): Port to listen on (default: 3000)
//! - `HEARSAY_MAX_CONNECTIONS`: Connection limit (default: 1000)
//! - `HEARSAY_LOG_LEVEL`: Log level when RUST_LOG is unset (default: info)
//! - `HEARSAY_LOG_FORMAT`: "pretty" or "json" (default: pretty)
//! - `RUST_LOG`: Full tracing filter, overrides HEARSAY_LOG_LEVEL

use hearsay::api::{serve, AppState};
use hearsay::config::{Config, LoggingConfig};
use hearsay::websocket::HubConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default();

    init_tracing(&config.logging);

    tracing::info!("Starting Hearsay relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Connection limit: {}, listen address: {}",
        config.server.max_connections,
        config.server.addr()
    );

    let hub_config = HubConfig {
        max_connections: config.server.max_connections,
    };
    let state = AppState::with_hub_config(config.server.clone(), hub_config);

    serve(state, &config.server).await?;

    tracing::info!("Hearsay relay stopped");
    Ok(())
}

/// Initialize tracing from RUST_LOG, falling back to the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "hearsay={},tower_http=debug",
            logging.level
        ))
    });

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
