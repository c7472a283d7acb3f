//! Reference encoder.
//!
//! Writes messages exactly as a conforming peer would, plus the raw escape
//! hatches needed to produce malformed input on purpose.

use bytes::{BufMut, Bytes, BytesMut};
use rpcscope_proto::{MessageKind, TypeTag, envelope::VERSION_1};

/// Byte-level message builder
///
/// Every method appends to the buffer and returns `&mut Self` for chaining.
/// Nothing is validated: counts, lengths and tags are written as given.
#[derive(Debug, Clone, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    /// Start a message body with no envelope
    #[must_use]
    pub fn body() -> Self {
        Self::default()
    }

    /// Start a message with a strict (versioned) envelope
    #[must_use]
    pub fn strict(method: &str, kind: MessageKind, sequence_id: i32) -> Self {
        let mut writer = Self::default();
        writer.buf.put_u32(VERSION_1 | u32::from(kind.to_u8()));
        writer.string(method);
        writer.buf.put_i32(sequence_id);
        writer
    }

    /// Start a message with a legacy (unversioned) envelope
    #[must_use]
    pub fn legacy(method: &str, kind: MessageKind, sequence_id: i32) -> Self {
        let mut writer = Self::default();
        writer.binary(method.as_bytes());
        writer.buf.put_u8(kind.to_u8());
        writer.buf.put_i32(sequence_id);
        writer
    }

    /// Field header: type tag then field id
    pub fn field(&mut self, tag: TypeTag, field_id: i16) -> &mut Self {
        self.field_raw(tag.to_u8(), field_id)
    }

    /// Field header with an arbitrary tag byte
    pub fn field_raw(&mut self, tag: u8, field_id: i16) -> &mut Self {
        self.buf.put_u8(tag);
        self.buf.put_i16(field_id);
        self
    }

    /// End of struct
    pub fn stop(&mut self) -> &mut Self {
        self.buf.put_u8(TypeTag::Stop.to_u8());
        self
    }

    /// `BOOL`
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.buf.put_u8(u8::from(value));
        self
    }

    /// `BYTE`
    pub fn byte(&mut self, value: i8) -> &mut Self {
        self.buf.put_i8(value);
        self
    }

    /// `I16`
    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.buf.put_i16(value);
        self
    }

    /// `I32`
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    /// `I64`
    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.buf.put_i64(value);
        self
    }

    /// `DOUBLE`
    pub fn double(&mut self, value: f64) -> &mut Self {
        self.buf.put_f64(value);
        self
    }

    /// `STRING` from text
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.binary(value.as_bytes())
    }

    /// `STRING` from raw bytes
    pub fn binary(&mut self, value: &[u8]) -> &mut Self {
        self.length(value.len() as i32);
        self.buf.put_slice(value);
        self
    }

    /// Bare i32 length or count, for declaring lengths that do not match
    /// the bytes that follow
    pub fn length(&mut self, len: i32) -> &mut Self {
        self.buf.put_i32(len);
        self
    }

    /// `MAP` header
    pub fn map_begin(&mut self, key: TypeTag, value: TypeTag, count: i32) -> &mut Self {
        self.buf.put_u8(key.to_u8());
        self.buf.put_u8(value.to_u8());
        self.buf.put_i32(count);
        self
    }

    /// `SET` header
    pub fn set_begin(&mut self, elem: TypeTag, count: i32) -> &mut Self {
        self.list_begin(elem, count)
    }

    /// `LIST` header
    pub fn list_begin(&mut self, elem: TypeTag, count: i32) -> &mut Self {
        self.buf.put_u8(elem.to_u8());
        self.buf.put_i32(count);
        self
    }

    /// Arbitrary bytes
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Bytes written so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and take the encoded bytes
    #[must_use]
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}
