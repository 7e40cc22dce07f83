// hkv-common - Shared types and protocol definitions for HybridKV
//
// This crate defines the error taxonomy and the request wire encoding used by
// clients talking to a HybridKV server.

pub mod error;
pub mod protocol;

// Re-export for convenience
pub use error::*;
pub use protocol::*;
