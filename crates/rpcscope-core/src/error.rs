//! Error types for message decoding.
//!
//! Only header-level problems are fatal. Everything that goes wrong inside
//! the struct body is recorded on the decoded tree instead (see
//! [`FieldValue::error`](crate::FieldValue::error) and
//! [`Fields::incomplete`](crate::Fields::incomplete)).

use rpcscope_proto::ProtocolError;
use thiserror::Error;

/// Fatal decode errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer cannot even hold the first header word
    #[error("message too short: {len} bytes")]
    TooShort {
        /// Length of the buffer
        len: usize,
    },

    /// The envelope could not be read
    #[error("framing error at byte {offset} of {total}: {source}")]
    Framing {
        /// Underlying wire error
        source: ProtocolError,
        /// Cursor position when the error occurred
        offset: usize,
        /// Length of the buffer
        total: usize,
    },
}

impl DecodeError {
    /// Bytes consumed before the failure
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::TooShort { .. } => 0,
            Self::Framing { offset, .. } => *offset,
        }
    }
}
