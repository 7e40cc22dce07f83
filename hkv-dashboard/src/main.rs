//! # HybridKV Dashboard
//!
//! Poll a HybridKV server's status command on behalf of browser clients.
//!
//! ## Design Principles
//!
//! 1. **Single Responsibility**: Wire parsing lives in `hkv-client`; this
//!    binary only wires configuration, HTTP, and logging together.
//! 2. **Async First**: Tokio handles concurrent polls; each poll owns its
//!    own upstream connection.
//! 3. **Fail-Open Defaults**: A failed fetch becomes a JSON error response
//!    for that poll only.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use hkv_dashboard::config::DashboardConfig;
use hkv_dashboard::http::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hkv=info".into()),
        )
        .init();

    let config = DashboardConfig::parse();
    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind dashboard on {addr}"))?;

    info!(
        target_host = %config.redis_host,
        target_port = config.redis_port,
        timeout_ms = config.fetch_timeout_ms,
        "dashboard on http://{addr}"
    );

    let state = Arc::new(AppState::from_config(&config));
    http::serve(listener, state).await;
    Ok(())
}
