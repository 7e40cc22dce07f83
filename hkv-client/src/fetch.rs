//! # Status Fetcher
//!
//! Query a HybridKV server's `INFO` command over a fresh TCP connection.
//!
//! ## Design Principles
//!
//! 1. **One Call, One Socket**: Every fetch connects, sends a single request,
//!    reads a single bulk reply, and drops the stream. Nothing is pooled, so
//!    concurrent fetches share no mutable state.
//! 2. **Bounded Wait**: The reply must complete within the idle bound that
//!    starts once the connection is established.
//! 3. **No Retries**: Every failure is returned as-is; retry policy belongs
//!    to the caller.
//!
//! ## Lifecycle
//!
//! ```text
//! Connecting -> Awaiting-Reply --(partial read)--> Awaiting-Reply
//!                    |
//!                    +--> Resolved | Failed -> Closed (stream dropped)
//! ```

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use hkv_common::{HkvError, HkvResult, RequestFrame};

use crate::reply::{BulkReader, BulkReply};
use crate::status::StatusRecord;

/// Default server host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_PORT: u16 = 6380;

/// Default bound on connect and on waiting for a complete reply.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 4096;

/// Target and timing for status fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server TCP port.
    pub port: u16,
    /// Maximum wait for a terminal reply after connecting. Also bounds the
    /// connect itself.
    pub idle_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Issues independent status queries against one server.
#[derive(Debug, Clone)]
pub struct StatusFetcher {
    config: FetchConfig,
    request: Bytes,
}

impl StatusFetcher {
    /// Creates a fetcher; the encoded `INFO` request is built once and reused.
    pub fn new(config: FetchConfig) -> Self {
        StatusFetcher {
            config,
            request: RequestFrame::info().to_bytes(),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Runs one status query.
    ///
    /// A nil reply yields an empty record. Errors map as follows:
    /// - malformed reply → `HkvError::Protocol`
    /// - no terminal reply within the idle bound → `HkvError::Timeout`
    /// - refused/reset/DNS failure, early EOF, or a connect that exceeds the
    ///   bound → `HkvError::Connection`
    pub async fn fetch_status(&self) -> HkvResult<StatusRecord> {
        let bound = self.config.idle_timeout;
        let target = (self.config.host.as_str(), self.config.port);

        let mut stream = match timeout(bound, TcpStream::connect(target)).await {
            Ok(stream) => stream?,
            Err(_) => {
                return Err(HkvError::Connection(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connect timed out",
                )));
            }
        };
        debug!(host = %self.config.host, port = self.config.port, "status fetch connected");

        // Dropping the exchange future on timeout leaves `stream` as the only
        // owner; it is closed when this function returns.
        let payload = match timeout(bound, self.exchange(&mut stream)).await {
            Ok(result) => result?,
            Err(_) => {
                debug!(timeout_ms = bound.as_millis() as u64, "status fetch timed out");
                return Err(HkvError::Timeout(bound));
            }
        };
        drop(stream);

        Ok(match payload {
            Some(payload) => StatusRecord::from_payload(&payload),
            None => StatusRecord::empty(),
        })
    }

    /// Sends the request and reads until the reply is terminal.
    ///
    /// Returns `None` for a nil reply.
    async fn exchange(&self, stream: &mut TcpStream) -> HkvResult<Option<Bytes>> {
        stream.write_all(&self.request).await?;

        let mut reader = BulkReader::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(HkvError::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed connection before reply completed",
                )));
            }
            match reader.feed(&chunk[..n])? {
                BulkReply::Incomplete => continue,
                BulkReply::Nil => {
                    debug!("status reply was nil");
                    return Ok(None);
                }
                BulkReply::Complete(payload) => {
                    debug!(payload_len = payload.len(), buffered = reader.buffered(), "status reply complete");
                    return Ok(Some(payload));
                }
            }
        }
    }
}
