//! Command-line and environment configuration.
//!
//! Every setting can come from a flag or an environment variable; flags win.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use hkv_client::fetch::{DEFAULT_HOST, DEFAULT_PORT};
use hkv_client::FetchConfig;

/// Default HTTP listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 8080;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "hkv-dashboard", about = "liveness dashboard for a HybridKV server")]
pub struct DashboardConfig {
    /// host of the key-value server to poll
    #[arg(long, env = "REDIS_HOST", default_value = DEFAULT_HOST)]
    pub redis_host: String,

    /// port of the key-value server to poll
    #[arg(long, env = "REDIS_PORT", default_value_t = DEFAULT_PORT)]
    pub redis_port: u16,

    /// address the HTTP server binds to
    #[arg(long, env = "HKV_DASHBOARD_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// port the HTTP server listens on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    pub port: u16,

    /// milliseconds to wait for a complete INFO reply before giving up
    #[arg(
        long,
        env = "HKV_FETCH_TIMEOUT_MS",
        default_value_t = 500,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout_ms: u64,

    /// directory with index.html and app.js overriding the built-in page
    #[arg(long, env = "HKV_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
}

impl DashboardConfig {
    /// Socket address for the HTTP listener.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Fetch settings derived from the server target and timeout.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            host: self.redis_host.clone(),
            port: self.redis_port,
            idle_timeout: Duration::from_millis(self.fetch_timeout_ms),
        }
    }
}
