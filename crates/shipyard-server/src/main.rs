//! shipyard-server binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shipyard_auth::{AuthGate, RateLimiter};
use shipyard_server::cli::Cli;
use shipyard_server::{AppState, SERVER_NAME, SERVER_VERSION, ServerConfig, ShipStore, router};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal outside development
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config =
        ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    config
        .logging()
        .init()
        .context("Failed to initialize logging")?;

    // Refuse to start without identity-provider settings
    let auth_config = config
        .auth_config()
        .context("Authentication is not configured")?;
    let gate = AuthGate::new(&auth_config).context("Failed to build auth gate")?;

    let store = Arc::new(ShipStore::new());
    if let Some(path) = &config.data_file {
        store.preload(path);
    }

    let state = AppState::new(
        store,
        Arc::new(gate),
        RateLimiter::new(config.rate_limit_config()),
    )
    .with_trusted_forwarded_headers(config.trust_forwarded_headers);

    let app = router(state, &config.allow_origins);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        server = SERVER_NAME,
        version = SERVER_VERSION,
        %addr,
        issuer = %auth_config.issuer,
        algorithm = %auth_config.algorithm,
        rate_limit = config.rate_limit,
        rate_limit_period = config.rate_limit_period,
        "Listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
