/* src/main.rs */

use anyhow::{Context, Result};
use blockgate::{config, routing, state};
use dotenvy::dotenv;
use fancy_log::{LogLevel, log, set_log_level};
use lazy_motd::lazy_motd;
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Initialization ---
    dotenv().ok();
    let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    let log_level = match level.to_lowercase().as_str() {
        "debug" => LogLevel::Debug,
        "warn" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    };
    set_log_level(log_level);
    lazy_motd!();

    // --- Load Config ---
    let app_config = match config::load_config() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            log(
                LogLevel::Error,
                &format!("Failed to load configuration: {e:#}"),
            );
            std::process::exit(1);
        }
    };

    if app_config.upstreams.is_empty() {
        log(
            LogLevel::Warn,
            "No upstreams configured; every lookup will fail with 502 until UPSTREAMS is set.",
        );
    } else {
        log(
            LogLevel::Info,
            &format!(
                "Upstreams in priority order: {}",
                app_config.upstreams.iter().collect::<Vec<_>>().join(", ")
            ),
        );
    }
    log(
        LogLevel::Info,
        &format!(
            "Cache TTL {:?}, outbound rate limit {} req/s, upstream timeout {:?}",
            app_config.cache_ttl, app_config.rate_limit_rps, app_config.upstream_timeout
        ),
    );

    // --- Shared State & Router ---
    let state = state::build_shared_state(app_config.clone())?;
    let app = routing::router(state);

    let bind_addr = format!("{}:{}", app_config.host, app_config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    log(
        LogLevel::Info,
        &format!("blockgate listening on {bind_addr}"),
    );

    // --- Start Server with Graceful Shutdown ---
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Sets up a handler for Ctrl+C and termination signals for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    log(LogLevel::Info, "Signal received, shutting down gracefully.");
}
