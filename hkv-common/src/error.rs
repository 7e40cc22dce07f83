//! # HybridKV Error Types
//!
//! ## Design Principles
//!
//! 1. **Stable Codes**: Each variant has a fixed numeric code for logs and
//!    JSON error bodies.
//! 2. **Categorized Ranges**: Codes are grouped by intent (transient, protocol).
//! 3. **Cause Preservation**: Transport failures carry the underlying
//!    `std::io::Error` instead of flattening it to a string.
//! 4. **Recoverability Hints**: Transient errors are explicitly marked as retryable.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type used across HybridKV components.
pub type HkvResult<T> = core::result::Result<T, HkvError>;

/// High-level category for grouping error codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HkvErrorCategory {
    /// Retryable conditions such as timeouts or dropped connections.
    Transient,
    /// The peer answered with something outside the supported protocol subset.
    Protocol,
}

impl HkvErrorCategory {
    /// Returns true if the category is safe to retry.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Framing violations detected while reading a bulk reply.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error)]
pub enum FramingError {
    /// The reply did not start with the bulk-string sigil.
    #[error("expected bulk reply, got prefix {0:#04x}")]
    UnexpectedPrefix(u8),
    /// The length field between the sigil and CRLF is not a decimal integer.
    #[error("invalid bulk length")]
    InvalidLength,
    /// The declared length cannot be addressed in memory.
    #[error("bulk length out of range")]
    LengthOverflow,
}

/// Errors surfaced by a status fetch.
#[derive(Debug, Error)]
pub enum HkvError {
    /// Protocol error: the reply had an unexpected shape (code 31).
    #[error("unexpected reply shape: {0}")]
    Protocol(#[from] FramingError),
    /// Transient error: no complete reply within the idle bound (code 21).
    #[error("timed out after {}ms waiting for reply", .0.as_millis())]
    Timeout(Duration),
    /// Transient error: transport failure before or during the exchange (code 23).
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),
}

impl HkvError {
    /// Returns the stable numeric code for the error.
    pub const fn code(&self) -> u16 {
        match self {
            Self::Timeout(_) => 21,
            Self::Connection(_) => 23,
            Self::Protocol(_) => 31,
        }
    }

    /// Returns the coarse category of the error.
    pub const fn category(&self) -> HkvErrorCategory {
        match self {
            Self::Timeout(_) | Self::Connection(_) => HkvErrorCategory::Transient,
            Self::Protocol(_) => HkvErrorCategory::Protocol,
        }
    }

    /// Returns true if callers should retry the operation.
    pub const fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_categories() {
        let timeout = HkvError::Timeout(Duration::from_millis(500));
        let refused = HkvError::Connection(io::Error::from(io::ErrorKind::ConnectionRefused));
        let framing = HkvError::from(FramingError::UnexpectedPrefix(b'-'));

        assert_eq!(timeout.category(), HkvErrorCategory::Transient);
        assert_eq!(refused.category(), HkvErrorCategory::Transient);
        assert_eq!(framing.category(), HkvErrorCategory::Protocol);
    }

    #[test]
    fn retryable_only_for_transient() {
        assert!(HkvError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!HkvError::Protocol(FramingError::InvalidLength).is_retryable());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(HkvError::Timeout(Duration::ZERO).code(), 21);
        assert_eq!(HkvError::Connection(io::ErrorKind::Other.into()).code(), 23);
        assert_eq!(HkvError::Protocol(FramingError::LengthOverflow).code(), 31);
    }

    #[test]
    fn messages_are_human_readable() {
        let err = HkvError::from(FramingError::UnexpectedPrefix(b'-'));
        assert_eq!(err.to_string(), "unexpected reply shape: expected bulk reply, got prefix 0x2d");

        let err = HkvError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "timed out after 500ms waiting for reply");
    }
}
