//! # HybridKV Client
//!
//! Minimal client for the server's status query: a streaming bulk-reply
//! reader, the `INFO` payload parser, and a per-call fetcher.

pub mod fetch;
pub mod reply;
pub mod status;

pub use fetch::{FetchConfig, StatusFetcher};
pub use reply::{BulkReader, BulkReply};
pub use status::StatusRecord;
