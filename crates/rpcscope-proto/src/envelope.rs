//! Message envelope (method name, kind, sequence id).
//!
//! Two historical header encodings exist for the same logical fields. They are
//! told apart by the sign of the first big endian i32:
//!
//! ```text
//! strict (first word < 0):
//!   [i32: 0x8001_00KK] [i32 len] [method bytes] [i32 seq]
//!          │      └─ message kind
//!          └──────── version marker (top 16 bits)
//!
//! legacy (first word >= 0):
//!   [i32 len] [method bytes] [u8 kind] [i32 seq]
//! ```

use serde::Serialize;

use crate::{
    MessageKind,
    cursor::{ByteCursor, MAX_STRING_LEN, text_or_preview},
    errors::{ProtocolError, Result},
};

/// Mask selecting the version marker of a strict header word
pub const VERSION_MASK: u32 = 0xFFFF_0000;

/// The only supported version marker
pub const VERSION_1: u32 = 0x8001_0000;

/// Mask selecting the message kind of a strict header word
pub const KIND_MASK: u32 = 0x0000_00FF;

/// Which header encoding a message used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Framing {
    /// Versioned header, first word negative
    Strict,
    /// Unversioned header, first word is the method name length
    Legacy,
}

/// Decoded message envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// RPC method name
    pub method: String,
    /// Message kind
    pub kind: MessageKind,
    /// Caller-chosen sequence id
    pub sequence_id: i32,
    /// Header encoding the message used
    pub framing: Framing,
}

impl Envelope {
    /// Read the envelope from the start of a message.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnsupportedVersion`] if a strict header carries a
    ///   version marker other than [`VERSION_1`]
    /// - [`ProtocolError::Truncated`], [`ProtocolError::NegativeLength`] or
    ///   [`ProtocolError::LengthTooLarge`] if the method name or any header
    ///   word is cut off or malformed
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let word = cursor.read_i32()?;

        let (method, kind, framing) = if word < 0 {
            let word = word as u32;
            let version = word & VERSION_MASK;
            if version != VERSION_1 {
                return Err(ProtocolError::UnsupportedVersion(version));
            }
            let kind = MessageKind::from_u8((word & KIND_MASK) as u8);
            let method = cursor.read_string()?;
            (method, kind, Framing::Strict)
        } else {
            // The first word is the length itself: no second length prefix.
            let len = word as usize;
            if len > MAX_STRING_LEN {
                return Err(ProtocolError::LengthTooLarge { len, max: MAX_STRING_LEN });
            }
            let method = text_or_preview(cursor.read_raw(len)?);
            let kind = MessageKind::from_u8(cursor.read_u8()?);
            (method, kind, Framing::Legacy)
        };

        let sequence_id = cursor.read_i32()?;

        Ok(Self { method, kind, sequence_id, framing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(method: &str, kind: u8, seq: i32) -> Vec<u8> {
        let mut buf = (VERSION_1 | u32::from(kind)).to_be_bytes().to_vec();
        buf.extend_from_slice(&(method.len() as i32).to_be_bytes());
        buf.extend_from_slice(method.as_bytes());
        buf.extend_from_slice(&seq.to_be_bytes());
        buf
    }

    fn legacy(method: &str, kind: u8, seq: i32) -> Vec<u8> {
        let mut buf = (method.len() as i32).to_be_bytes().to_vec();
        buf.extend_from_slice(method.as_bytes());
        buf.push(kind);
        buf.extend_from_slice(&seq.to_be_bytes());
        buf
    }

    #[test]
    fn strict_header() {
        let buf = strict("GetTables", 1, 7);
        let mut cursor = ByteCursor::new(&buf);
        let envelope = Envelope::read(&mut cursor).expect("should parse");

        assert_eq!(envelope.method, "GetTables");
        assert_eq!(envelope.kind, MessageKind::Call);
        assert_eq!(envelope.sequence_id, 7);
        assert_eq!(envelope.framing, Framing::Strict);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn legacy_header() {
        let buf = legacy("FetchResults", 2, -3);
        let mut cursor = ByteCursor::new(&buf);
        let envelope = Envelope::read(&mut cursor).expect("should parse");

        assert_eq!(envelope.method, "FetchResults");
        assert_eq!(envelope.kind, MessageKind::Reply);
        assert_eq!(envelope.sequence_id, -3);
        assert_eq!(envelope.framing, Framing::Legacy);
    }

    #[test]
    fn framings_agree() {
        let a = Envelope::read(&mut ByteCursor::new(&strict("CloseSession", 4, 99))).unwrap();
        let b = Envelope::read(&mut ByteCursor::new(&legacy("CloseSession", 4, 99))).unwrap();
        assert_eq!(
            (a.method, a.kind, a.sequence_id),
            (b.method, b.kind, b.sequence_id)
        );
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let buf = strict("Ping", 0x2A, 0);
        let envelope = Envelope::read(&mut ByteCursor::new(&buf)).unwrap();
        assert_eq!(envelope.kind, MessageKind::Unknown(0x2A));
    }

    #[test]
    fn reject_unsupported_version() {
        let mut buf = strict("OpenSession", 1, 0);
        buf[1] = 0x02;
        let result = Envelope::read(&mut ByteCursor::new(&buf));
        assert_eq!(result, Err(ProtocolError::UnsupportedVersion(0x8002_0000)));
    }

    #[test]
    fn reject_truncated_sequence_id() {
        let mut buf = strict("OpenSession", 1, 0);
        buf.truncate(buf.len() - 2);
        let result = Envelope::read(&mut ByteCursor::new(&buf));
        assert!(matches!(result, Err(ProtocolError::Truncated { needed: 4, available: 2, .. })));
    }

    #[test]
    fn reject_truncated_legacy_method() {
        let mut buf = 20i32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"short");
        let result = Envelope::read(&mut ByteCursor::new(&buf));
        assert!(matches!(result, Err(ProtocolError::Truncated { needed: 20, .. })));
    }
}
