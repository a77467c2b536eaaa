//! # bookshop
//!
//! Minimal bookshop REST service with cookie-based session auth.
//!
//! ## Architecture
//!
//! - **Credentials**: bcrypt password hashing at a fixed cost
//! - **Token**: HS256 session tokens valid for 7 days, carried in the `Authorisation` cookie
//! - **Store**: SQLite via `sqlx` for users and books, with an in-memory variant for tests
//! - **HTTP**: Axum router with a session gate in front of protected routes, request IDs,
//!   and graceful shutdown

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod catalog;
mod config;
mod credentials;
mod http;
mod store;
mod token;
mod users;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_environment_file, AppConfig, Cli};
use crate::http::{router, AppState};
use crate::store::{MemoryStore, SqliteStore};
use crate::token::TokenSigner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let env_file = load_environment_file().context("failed to load environment file")?;
    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli).context("failed to load configuration")?;
    info!(
        bind = %config.bind,
        database_url = %config.database_url,
        max_connections = config.max_connections,
        in_memory = config.in_memory,
        env_file = ?env_file.as_ref().map(|path| path.display().to_string()),
        "configuration loaded"
    );

    let tokens = TokenSigner::new(&config.secret_token_key);
    let state = if config.in_memory {
        warn!("in-memory store enabled; users are lost on shutdown");
        AppState::new(MemoryStore::new(), tokens)
    } else {
        let store = SqliteStore::connect(&config.database_url, config.max_connections)
            .await
            .with_context(|| format!("failed to open database {}", config.database_url))?;
        AppState::new(store, tokens)
    };
    let app = router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    if config.bind.ip().is_loopback() {
        warn!(
            bind = %config.bind,
            "binding to loopback; use --bind 0.0.0.0:8080 for LAN access"
        );
    }

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "bookshop listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}
