//! Sequential reader over an immutable, fully buffered message.
//!
//! The cursor decodes the primitive wire types (big endian, two's complement)
//! and tracks how many bytes have been consumed. Reads are all-or-nothing: a
//! read that fails leaves the position where it was, so callers can rewind and
//! retry with a different strategy.

use zerocopy::{
    FromBytes,
    byteorder::big_endian::{F64, I16, I32, I64},
};

use crate::errors::{ProtocolError, Result};

/// Maximum accepted byte length of a string (10 MiB)
pub const MAX_STRING_LEN: usize = 10 * 1024 * 1024;

/// Number of bytes shown in the hex preview of a non-UTF-8 string
pub const BINARY_PREVIEW_LEN: usize = 50;

/// Cursor over a byte buffer.
///
/// # Invariants
///
/// - `pos <= buf.len()` at all times.
/// - A failed read does not change `pos`.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `buf`
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the underlying buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Move to an absolute position, clamped to the buffer length.
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.buf.len());
    }

    /// Consume everything that is left.
    pub fn skip_to_end(&mut self) {
        self.pos = self.buf.len();
    }

    fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn truncated(&self, needed: usize) -> ProtocolError {
        ProtocolError::Truncated { offset: self.pos, needed, available: self.remaining() }
    }

    fn read_be<T: FromBytes>(&mut self) -> Result<T> {
        let needed = std::mem::size_of::<T>();
        let (value, _) = T::read_from_prefix(self.rest()).map_err(|_| self.truncated(needed))?;
        self.pos += needed;
        Ok(value)
    }

    /// Consume exactly `n` bytes and return them
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than `n` bytes remain.
    pub fn read_raw(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.truncated(n));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consume `n` bytes without looking at them
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than `n` bytes remain.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.read_raw(n).map(|_| ())
    }

    /// Read a signed byte
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] on end of buffer.
    pub fn read_byte(&mut self) -> Result<i8> {
        self.read_be::<i8>()
    }

    /// Read an unsigned byte (type tags, collection element tags)
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] on end of buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_be::<u8>()
    }

    /// Read a big endian i16
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 2 bytes remain.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_be::<I16>().map(I16::get)
    }

    /// Read a big endian i32
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_be::<I32>().map(I32::get)
    }

    /// Read a big endian i64
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 8 bytes remain.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_be::<I64>().map(I64::get)
    }

    /// Read a big endian IEEE-754 double
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 8 bytes remain.
    pub fn read_double(&mut self) -> Result<f64> {
        self.read_be::<F64>().map(F64::get)
    }

    /// Read an i32 length prefix and check it against `max`
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if the prefix itself is cut off
    /// - [`ProtocolError::NegativeLength`] for a negative prefix
    /// - [`ProtocolError::LengthTooLarge`] if the prefix exceeds `max`
    pub fn read_length(&mut self, max: usize) -> Result<usize> {
        let start = self.pos;
        let raw = self.read_i32()?;
        let len = usize::try_from(raw).map_err(|_| {
            self.pos = start;
            ProtocolError::NegativeLength(raw)
        })?;
        if len > max {
            self.pos = start;
            return Err(ProtocolError::LengthTooLarge { len, max });
        }
        Ok(len)
    }

    /// Read a length-prefixed string.
    ///
    /// Bytes that are not valid UTF-8 do not fail the read: they are returned
    /// as a `<binary:...>` hex preview (see [`text_or_preview`]), because a
    /// binary identifier must not abort an otherwise decodable message.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::NegativeLength`] or [`ProtocolError::LengthTooLarge`]
    ///   (ceiling [`MAX_STRING_LEN`]) for a bad prefix
    /// - [`ProtocolError::Truncated`] if the body extends past the buffer
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let len = self.read_length(MAX_STRING_LEN)?;
        match self.read_raw(len) {
            Ok(bytes) => Ok(text_or_preview(bytes)),
            Err(err) => {
                self.pos = start;
                Err(err)
            },
        }
    }

    /// Skip a length-prefixed string without decoding it.
    ///
    /// Unlike [`ByteCursor::read_string`] no ceiling is applied: bytes that
    /// are present in the buffer can always be stepped over.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::NegativeLength`] or [`ProtocolError::Truncated`].
    pub fn skip_string(&mut self) -> Result<()> {
        let start = self.pos;
        let len = self.read_length(usize::MAX)?;
        self.advance(len).map_err(|err| {
            self.pos = start;
            err
        })
    }
}

/// Decode bytes as UTF-8, or render a bounded hex preview if they are not.
///
/// The preview covers the first [`BINARY_PREVIEW_LEN`] bytes and ends with
/// `...` when the input was longer.
#[must_use]
pub fn text_or_preview(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => {
            let shown = &bytes[..bytes.len().min(BINARY_PREVIEW_LEN)];
            let ellipsis = if bytes.len() > BINARY_PREVIEW_LEN { "..." } else { "" };
            format!("<binary:{}{}>", hex::encode(shown), ellipsis)
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn string_bytes(body: &[u8]) -> Vec<u8> {
        let mut buf = (body.len() as i32).to_be_bytes().to_vec();
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn reads_big_endian_primitives() {
        let mut buf = vec![0xFF];
        buf.extend_from_slice(&(-2i16).to_be_bytes());
        buf.extend_from_slice(&0x0102_0304i32.to_be_bytes());
        buf.extend_from_slice(&i64::MIN.to_be_bytes());
        buf.extend_from_slice(&1.5f64.to_be_bytes());

        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_byte(), Ok(-1));
        assert_eq!(cursor.read_i16(), Ok(-2));
        assert_eq!(cursor.read_i32(), Ok(0x0102_0304));
        assert_eq!(cursor.read_i64(), Ok(i64::MIN));
        assert_eq!(cursor.read_double(), Ok(1.5));
        assert_eq!(cursor.position(), buf.len());
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn truncated_read_does_not_advance() {
        let buf = [0x00, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_byte(), Ok(0));

        let result = cursor.read_i32();
        assert_eq!(result, Err(ProtocolError::Truncated { offset: 1, needed: 4, available: 2 }));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn reads_utf8_string() {
        let buf = string_bytes("héllo".as_bytes());
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_string().as_deref(), Ok("héllo"));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn invalid_utf8_becomes_hex_preview() {
        let buf = string_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_string().as_deref(), Ok("<binary:deadbeef>"));
    }

    #[test]
    fn long_binary_preview_is_bounded() {
        let body = vec![0xFFu8; 80];
        let preview = text_or_preview(&body);
        assert_eq!(preview, format!("<binary:{}...>", "ff".repeat(BINARY_PREVIEW_LEN)));
    }

    #[test]
    fn reject_negative_string_length() {
        let buf = (-5i32).to_be_bytes();
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(cursor.read_string(), Err(ProtocolError::NegativeLength(-5)));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn reject_oversized_string_length() {
        let buf = ((MAX_STRING_LEN + 1) as i32).to_be_bytes();
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(
            cursor.read_string(),
            Err(ProtocolError::LengthTooLarge { len: MAX_STRING_LEN + 1, max: MAX_STRING_LEN })
        );
    }

    #[test]
    fn truncated_string_body_rewinds_to_prefix() {
        let mut buf = 10i32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"abc");
        let mut cursor = ByteCursor::new(&buf);

        let result = cursor.read_string();
        assert_eq!(result, Err(ProtocolError::Truncated { offset: 4, needed: 10, available: 3 }));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn skip_string_ignores_ceiling() {
        let mut cursor = ByteCursor::new(&[0, 0, 0, 2, b'o', b'k', 0x7F]);
        assert_eq!(cursor.skip_string(), Ok(()));
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn set_position_is_clamped() {
        let mut cursor = ByteCursor::new(&[1, 2, 3]);
        cursor.set_position(10);
        assert_eq!(cursor.position(), 3);
        cursor.set_position(1);
        assert_eq!(cursor.read_u8(), Ok(2));
        cursor.skip_to_end();
        assert_eq!(cursor.remaining(), 0);
    }

    proptest! {
        #[test]
        fn arbitrary_bytes_never_overrun(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut cursor = ByteCursor::new(&bytes);
            while cursor.read_string().is_ok() || cursor.read_i16().is_ok() {}
            prop_assert!(cursor.position() <= bytes.len());
        }
    }
}
