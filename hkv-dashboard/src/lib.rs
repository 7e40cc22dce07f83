//! # HybridKV Dashboard
//!
//! Republish a HybridKV server's `INFO` fields as JSON over HTTP and serve a
//! page that polls them once per second.

pub mod assets;
pub mod config;
pub mod http;
pub mod metrics;
