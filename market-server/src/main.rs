//! market-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from flags and `MARKET_*` environment variables.
//! 2. Initialise structured tracing (JSON or plain, stdout or a rolling file).
//! 3. Open the database and run pending migrations.
//! 4. Start the event logger.
//! 5. Build the Axum router and serve HTTP with graceful shutdown.

mod config;
mod entities;
mod error;
mod events;
mod identity;
mod middleware;
mod routes;
mod schemas;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::Config;
use crate::entities::AnyStore;
use crate::events::{EventBus, MarketEvent};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::parse();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "market-server starting");

    // ── 3. Database ────────────────────────────────────────────────────────────
    let store = AnyStore::connect(&cfg.database_url, cfg.database_max_connections).await?;
    info!(database_url = %cfg.database_url, "database ready");

    // ── 4. Shared state & event logger ─────────────────────────────────────────
    let events = EventBus::new(cfg.event_capacity);
    tokio::spawn(log_events(events.subscribe()));

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        store: Arc::new(store),
        events,
    });

    // ── 5. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("market-server stopped");
    Ok(())
}

fn init_tracing(cfg: &Config) -> WorkerGuard {
    // Build the log-level filter, warning loudly if the configured value is
    // not a valid tracing filter expression.
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: MARKET_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let (writer, guard) = match &cfg.log_dir {
        Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(
            dir,
            "market-server.log",
        )),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(cfg.log_dir.is_none())
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    guard
}

/// Record every market event until the bus is dropped.
async fn log_events(mut rx: broadcast::Receiver<MarketEvent>) {
    loop {
        match rx.recv().await {
            Ok(MarketEvent::AppCreated {
                app_id,
                tenant_id,
                account_id,
                mode,
            }) => {
                info!(%app_id, %tenant_id, %account_id, %mode, "app created from marketplace");
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "event logger lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
