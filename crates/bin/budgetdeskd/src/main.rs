//! # budgetdeskd: budgetdesk daemon
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize `tracing` with the configured filter
//! - Open the `SQLite` database and run migrations
//! - Build the mediator and the axum router (see [`budgetdeskd::wiring`])
//! - Run the cache sweeper for the lifetime of the server
//! - Bind to a TCP port and serve until SIGTERM/SIGINT, then stop the
//!   sweeper and close the pool

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use budgetdeskd::config::Config;
use budgetdeskd::wiring;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.logging.filter)?;

    let app = wiring::build(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = app.cache.spawn_sweeper(shutdown_rx);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "budgetdeskd listening");

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send_replace(true);
    sweeper.await?;
    app.database.close().await;
    tracing::info!("shutdown complete");

    Ok(())
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing subscriber: {err}"))
}

/// Resolves on the first of SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
