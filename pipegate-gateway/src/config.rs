//! Process configuration, from flags or environment.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

use crate::dispatch::RemoteOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Text,
}

/// Translation gateway for the pipeline lifecycle API.
#[derive(Debug, Clone, Parser)]
#[command(name = "pipegate", version)]
pub struct GatewayConfig {
    /// Address the HTTP listener binds.
    #[arg(long, env = "PIPEGATE_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// Backend RPC endpoint, e.g. http://127.0.0.1:9090.
    #[arg(long, env = "PIPEGATE_UPSTREAM_ENDPOINT")]
    pub upstream_endpoint: Url,

    /// Per-call deadline in milliseconds.
    #[arg(long, env = "PIPEGATE_CALL_TIMEOUT_MS", default_value_t = 30_000)]
    pub call_timeout_ms: u64,

    /// Upstream connect timeout in milliseconds.
    #[arg(long, env = "PIPEGATE_CONNECT_TIMEOUT_MS", default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    /// Maximum accepted request body size in bytes.
    #[arg(long, env = "PIPEGATE_MAX_BODY_BYTES", default_value_t = 4 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Idle upstream connections kept per host.
    #[arg(long, env = "PIPEGATE_POOL_MAX_IDLE", default_value_t = 32)]
    pub pool_max_idle_per_host: usize,

    /// Log output format.
    #[arg(long, env = "PIPEGATE_LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,
}

impl GatewayConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn remote_options(&self) -> RemoteOptions {
        RemoteOptions {
            call_timeout: self.call_timeout(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            pool_max_idle_per_host: self.pool_max_idle_per_host,
        }
    }
}
