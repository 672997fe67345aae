//! This server exposes an in-memory collection of notes over a JSON API.
use std::sync::Arc;

use anyhow::Context;
use notes::{
    config::{self, ServerConfig},
    state::AppState,
};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Sets up logging to stdout, or to a daily rolling file when `log_dir` is
/// configured. The returned guard must be held until shutdown.
fn init_logging(config: &ServerConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "notes-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set global default")?;

            Ok(Some(guard))
        }
        None => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .finish();

            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set global default")?;

            Ok(None)
        }
    }
}

/// Resolves once the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for the shutdown signal: {:?}", err);
        std::future::pending::<()>().await;
    }

    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_file_path = config::config_file_path("server.toml")?;
    let config =
        ServerConfig::load(Some(&config_file_path)).context("failed to load config file")?;
    let _guard = init_logging(&config)?;
    let addr = config.listen_addr()?;

    info!("config file path: {:?}", config_file_path);

    let state = Arc::new(AppState::new());

    let app = notes::app(state, &config);

    let server = axum::Server::try_bind(&addr).map_err(|err| {
        error!("failed to bind {}: {}", addr, err);
        err
    })?;

    info!("listening on {}", addr);

    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
