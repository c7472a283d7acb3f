//! Message kinds carried in the envelope.

use std::fmt;

use serde::Serialize;

/// Kind of message: request, response, error response or fire-and-forget.
///
/// Kinds outside the assigned range are preserved as [`MessageKind::Unknown`]
/// so that a diagnostic tool can still show what was on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MessageKind {
    /// Request (1)
    Call,
    /// Response (2)
    Reply,
    /// Error response (3)
    Exception,
    /// Request without a response (4)
    OneWay,
    /// Any other value
    Unknown(u8),
}

impl MessageKind {
    /// Convert from raw u8 value. Total: unassigned values map to `Unknown`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Call,
            2 => Self::Reply,
            3 => Self::Exception,
            4 => Self::OneWay,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw u8 value
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Call => 1,
            Self::Reply => 2,
            Self::Exception => 3,
            Self::OneWay => 4,
            Self::Unknown(other) => other,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => f.write_str("CALL"),
            Self::Reply => f.write_str("REPLY"),
            Self::Exception => f.write_str("EXCEPTION"),
            Self::OneWay => f.write_str("ONEWAY"),
            Self::Unknown(other) => write!(f, "UNKNOWN({other})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for raw in 0u8..=255 {
            assert_eq!(MessageKind::from_u8(raw).to_u8(), raw);
        }
    }

    #[test]
    fn display_labels() {
        assert_eq!(MessageKind::Call.to_string(), "CALL");
        assert_eq!(MessageKind::OneWay.to_string(), "ONEWAY");
        assert_eq!(MessageKind::from_u8(9).to_string(), "UNKNOWN(9)");
    }
}
