//! Error types for the binary RPC wire format.
//!
//! All errors are structured, testable, and carry the byte offset or size that
//! caused them.

use thiserror::Error;

/// Wire-level errors raised while reading primitives, strings or the message
/// envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // Cursor errors
    /// Not enough bytes left for the requested read
    #[error(
        "unexpected end of buffer at offset {offset}: needed {needed} bytes, {available} available"
    )]
    Truncated {
        /// Offset at which the read started
        offset: usize,
        /// Bytes the read required
        needed: usize,
        /// Bytes remaining in the buffer
        available: usize,
    },

    /// A length prefix was negative
    #[error("invalid length prefix: {0}")]
    NegativeLength(i32),

    /// A length prefix exceeded the sanity ceiling
    #[error("length {len} exceeds maximum {max}")]
    LengthTooLarge {
        /// Length found on the wire
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    // Envelope errors
    /// Strict header carried an unknown version marker
    #[error("unsupported protocol version: {0:#010x}")]
    UnsupportedVersion(u32),

    // Skip errors
    /// A value of this type tag has no known width and cannot be skipped
    #[error("cannot skip value with unknown type tag {0}")]
    UnknownType(u8),

    /// Skipping a value descended past the nesting limit
    #[error("maximum nesting depth {0} exceeded while skipping value")]
    SkipDepthExceeded(usize),
}

impl ProtocolError {
    /// Returns true if the error means the buffer ended early.
    ///
    /// Truncation is the only error where more input could have made the read
    /// succeed; every other variant describes bytes that are present but
    /// malformed.
    #[must_use]
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// Convenient Result type alias for wire operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_truncated_is_truncation() {
        assert!(ProtocolError::Truncated { offset: 0, needed: 4, available: 1 }.is_truncation());
        assert!(!ProtocolError::NegativeLength(-1).is_truncation());
        assert!(!ProtocolError::UnsupportedVersion(0x8002_0000).is_truncation());
    }

    #[test]
    fn version_renders_as_hex() {
        let err = ProtocolError::UnsupportedVersion(0x8002_0000);
        assert_eq!(err.to_string(), "unsupported protocol version: 0x80020000");
    }
}
