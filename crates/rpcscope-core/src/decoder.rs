//! Recursive-descent decoder for message bodies.
//!
//! The decoder never trusts the buffer. Every value is read through the
//! bounds-checked [`ByteCursor`], nesting is bounded by
//! [`DecoderConfig::max_depth`], and declared collection sizes above
//! [`DecoderConfig::max_collection_len`] are replaced by placeholders before
//! any element is allocated.
//!
//! # Error Recovery
//!
//! A field whose value fails to decode does not fail the message. The decoder
//! records the error on that field, rewinds to the start of the value and
//! skips it with [`Decoder::skip_value`], which only needs the bytes to be
//! present, not well-formed. Sibling fields after it still decode.
//!
//! When even the skip fails (the value runs past the end of the buffer, or a
//! tag has no known layout) there is no way to find the next field boundary.
//! The decoder is then *desynchronized*: the struct being decoded and every
//! struct enclosing it stop and are marked incomplete with the same reason.

use rpcscope_proto::{
    ByteCursor, DEFAULT_MAX_DEPTH, Envelope, MAX_COLLECTION_LEN, MIN_MESSAGE_LEN, ProtocolError,
    Result as WireResult, TypeTag, tag_name,
};

use crate::{
    error::DecodeError,
    schema::{FieldNameMap, FieldNameResolver, PROTOCOL_FAMILY, SchemaRegistry, is_known_method},
    value::{CollectionKind, DecodedMessage, FieldValue, Fields, Placeholder, Value},
};

/// Decoder limits and recovery behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum struct nesting depth; deeper structs become
    /// [`Placeholder::DepthExceeded`]
    pub max_depth: usize,
    /// Largest collection that is materialized
    pub max_collection_len: usize,
    /// Largest number of collection elements materialized across the whole
    /// message; collections past it become
    /// [`Placeholder::ElementBudgetExhausted`]
    pub max_total_elements: usize,
    /// Skip the bytes behind depth and size placeholders so that the fields
    /// after them still line up. When false the placeholder consumes nothing
    /// and decoding carries on from the same position.
    pub resync_placeholders: bool,
    /// Nesting limit while skipping
    pub max_skip_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_len: MAX_COLLECTION_LEN,
            max_total_elements: 1_000_000,
            resync_placeholders: true,
            max_skip_depth: 256,
        }
    }
}

/// Work left on the skip stack
#[derive(Debug, Clone, Copy)]
enum Pending {
    /// Inside a struct, waiting for its STOP tag
    Struct,
    /// Collection items still to skip. Items alternate between the two tags
    /// (key, value, key, ...); lists and sets carry the same tag twice.
    Items { tags: [u8; 2], remaining: u64 },
}

/// Single-use decoder over one buffered message.
///
/// # Invariants
///
/// - The cursor never moves past the end of the buffer.
/// - Once `desync` is set it is never cleared; every open struct stops.
pub struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    names: FieldNameMap,
    config: DecoderConfig,
    elements: usize,
    desync: Option<String>,
}

impl<'a> Decoder<'a> {
    /// Create a decoder positioned at the start of `buf`
    #[must_use]
    pub fn new(buf: &'a [u8], config: DecoderConfig) -> Self {
        Self {
            cursor: ByteCursor::new(buf),
            names: FieldNameMap::empty(),
            config,
            elements: 0,
            desync: None,
        }
    }

    /// Use `names` for struct keys instead of `field_<id>`
    #[must_use]
    pub fn with_field_names(mut self, names: FieldNameMap) -> Self {
        self.names = names;
        self
    }

    /// Bytes consumed so far
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Why decoding lost track of field boundaries, if it did
    #[must_use]
    pub fn desync_reason(&self) -> Option<&str> {
        self.desync.as_deref()
    }

    /// Decode a complete message: envelope, then the top-level struct.
    ///
    /// Field names are resolved through `registry` once the envelope is
    /// known. Body-level problems never fail the decode; they are recorded on
    /// the returned tree.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::TooShort`] if the buffer is shorter than 4 bytes
    /// - [`DecodeError::Framing`] if the envelope cannot be read
    pub fn decode_message(
        mut self,
        registry: Option<&dyn SchemaRegistry>,
    ) -> Result<DecodedMessage, DecodeError> {
        let total_bytes = self.cursor.len();
        if total_bytes < MIN_MESSAGE_LEN {
            return Err(DecodeError::TooShort { len: total_bytes });
        }

        let envelope = Envelope::read(&mut self.cursor).map_err(|source| DecodeError::Framing {
            source,
            offset: self.cursor.position(),
            total: total_bytes,
        })?;

        tracing::debug!(
            method = %envelope.method,
            kind = %envelope.kind,
            sequence_id = envelope.sequence_id,
            framing = ?envelope.framing,
            "Decoded envelope"
        );

        let (names, field_names) =
            FieldNameResolver::new(registry).resolve(&envelope.method, envelope.kind);
        self.names = names;

        let fields = self.decode_struct(self.config.max_depth);
        let protocol = is_known_method(&envelope.method).then_some(PROTOCOL_FAMILY);

        Ok(DecodedMessage {
            method: envelope.method,
            kind: envelope.kind,
            sequence_id: envelope.sequence_id,
            framing: envelope.framing,
            fields,
            bytes_consumed: self.cursor.position(),
            total_bytes,
            protocol,
            field_names,
        })
    }

    /// Decode struct fields up to and including the STOP tag.
    ///
    /// `max_depth` is the depth budget of the struct's own field values.
    /// The result is always returned; a struct that ends early carries the
    /// reason in [`Fields::incomplete`].
    pub fn decode_struct(&mut self, max_depth: usize) -> Fields {
        let mut fields = Fields::new();

        loop {
            if let Some(reason) = &self.desync {
                fields.mark_incomplete(reason.clone());
                break;
            }

            let header = self.cursor.read_u8().and_then(|tag| {
                if tag == TypeTag::Stop.to_u8() {
                    Ok(None)
                } else {
                    self.cursor.read_i16().map(|field_id| Some((tag, field_id)))
                }
            });

            let (tag, field_id) = match header {
                Ok(None) => break,
                Ok(Some(header)) => header,
                Err(err) => {
                    tracing::debug!(
                        offset = self.cursor.position(),
                        error = %err,
                        "Struct ended without STOP"
                    );
                    self.desync = Some(err.to_string());
                    continue;
                },
            };

            let key = self.names.key_for(field_id);
            let start = self.cursor.position();

            match self.decode_value(tag, max_depth) {
                Ok(value) => fields.insert(key, FieldValue::decoded(tag, field_id, value)),
                Err(err) => {
                    tracing::warn!(
                        field_id,
                        type_tag = %tag_name(tag),
                        offset = start,
                        error = %err,
                        "Field value failed to decode"
                    );
                    fields.insert(key, FieldValue::failed(tag, field_id, err.to_string()));

                    self.cursor.set_position(start);
                    if let Err(skip_err) = self.skip_value(tag, self.config.max_skip_depth) {
                        tracing::warn!(field_id, error = %skip_err, "Cannot skip failed field");
                        self.desync = Some(format!("abandoned after field {field_id}: {skip_err}"));
                    }
                },
            }
        }

        fields
    }

    /// Decode one value of type `tag`.
    ///
    /// Unknown tags and values past the depth budget come back as
    /// placeholders rather than errors, so the field itself is kept and the
    /// struct is not failed. An unknown tag still ends decoding of the
    /// message body: its width is unknown, so no later field boundary can be
    /// found. The decoder is left desynchronized and every enclosing struct
    /// keeps the fields read so far and is marked incomplete.
    ///
    /// # Errors
    ///
    /// Any [`ProtocolError`] from the cursor: truncation, or a string length
    /// that is negative or above the ceiling.
    pub fn decode_value(&mut self, tag: u8, max_depth: usize) -> WireResult<Value> {
        if max_depth == 0 {
            return Ok(self.depth_exceeded(tag));
        }

        let Some(wire_type) = TypeTag::from_u8(tag) else {
            return Ok(self.unknown_type(tag));
        };

        let value = match wire_type {
            TypeTag::Stop => return Ok(self.unknown_type(tag)),
            TypeTag::Void => Value::Placeholder(Placeholder::Void),
            TypeTag::Bool => Value::Bool(self.cursor.read_byte()? != 0),
            TypeTag::Byte => Value::I8(self.cursor.read_byte()?),
            TypeTag::Double => Value::Double(self.cursor.read_double()?),
            TypeTag::I16 => Value::I16(self.cursor.read_i16()?),
            TypeTag::I32 => Value::I32(self.cursor.read_i32()?),
            TypeTag::I64 => Value::I64(self.cursor.read_i64()?),
            TypeTag::String => Value::Text(self.cursor.read_string()?),
            TypeTag::Struct => {
                let nested = max_depth - 1;
                if nested == 0 {
                    return Ok(self.depth_exceeded(tag));
                }
                Value::Struct(self.decode_struct(nested))
            },
            TypeTag::Map => self.decode_map(max_depth - 1)?,
            TypeTag::Set => self.decode_elements(CollectionKind::Set, max_depth - 1)?,
            TypeTag::List => self.decode_elements(CollectionKind::List, max_depth - 1)?,
        };

        Ok(value)
    }

    fn decode_map(&mut self, max_depth: usize) -> WireResult<Value> {
        let key_tag = self.cursor.read_u8()?;
        let value_tag = self.cursor.read_u8()?;
        let len = self.cursor.read_i32()?;

        if let Some(placeholder) = self.oversized(CollectionKind::Map, [key_tag, value_tag], len) {
            return Ok(placeholder);
        }

        let count = usize::try_from(len).unwrap_or(0);
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let key = self.decode_value(key_tag, max_depth)?;
            if self.desync.is_some() {
                break;
            }
            let value = self.decode_value(value_tag, max_depth)?;
            entries.push((key, value));
            if self.desync.is_some() {
                break;
            }
        }

        Ok(Value::Map(entries))
    }

    fn decode_elements(&mut self, kind: CollectionKind, max_depth: usize) -> WireResult<Value> {
        let elem_tag = self.cursor.read_u8()?;
        let len = self.cursor.read_i32()?;

        if let Some(placeholder) = self.oversized(kind, [elem_tag, elem_tag], len) {
            return Ok(placeholder);
        }

        let count = usize::try_from(len).unwrap_or(0);
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.decode_value(elem_tag, max_depth)?);
            if self.desync.is_some() {
                break;
            }
        }

        Ok(match kind {
            CollectionKind::Set => Value::Set(items),
            CollectionKind::List | CollectionKind::Map => Value::List(items),
        })
    }

    fn rewind_on_err<T>(&mut self, start: usize, result: WireResult<T>) -> WireResult<T> {
        if result.is_err() {
            self.cursor.set_position(start);
        }
        result
    }

    /// Placeholder for a collection too large to materialize, or `None` if
    /// it may be decoded. Negative counts decode as empty.
    fn oversized(&mut self, kind: CollectionKind, tags: [u8; 2], len: i32) -> Option<Value> {
        let count = usize::try_from(len).ok()?;
        let budget = self.config.max_total_elements.saturating_sub(self.elements);
        let placeholder = if count > self.config.max_collection_len {
            Placeholder::OversizedCollection { kind, len }
        } else if count > budget {
            Placeholder::ElementBudgetExhausted { kind, len }
        } else {
            self.elements += count;
            return None;
        };

        tracing::debug!(
            ?kind,
            len,
            offset = self.cursor.position(),
            %placeholder,
            "Collection not materialized"
        );

        if self.config.resync_placeholders {
            let per_entry = if kind == CollectionKind::Map { 2 } else { 1 };
            if let Err(err) = self.skip_items(tags, count as u64 * per_entry) {
                self.desync = Some(format!("cannot skip {len} {kind:?} entries: {err}"));
            }
        }

        Some(Value::Placeholder(placeholder))
    }

    fn depth_exceeded(&mut self, tag: u8) -> Value {
        tracing::debug!(offset = self.cursor.position(), "Maximum nesting depth reached");
        if self.config.resync_placeholders {
            if let Err(err) = self.skip_value(tag, self.config.max_skip_depth) {
                self.desync = Some(format!("cannot skip over-deep value: {err}"));
            }
        }
        Value::Placeholder(Placeholder::DepthExceeded)
    }

    fn unknown_type(&mut self, tag: u8) -> Value {
        tracing::warn!(tag, offset = self.cursor.position(), "Unknown type tag");
        self.desync = Some(format!("unknown type tag {tag}"));
        Value::Placeholder(Placeholder::UnknownType(tag))
    }

    /// Advance past one value of type `tag` without building it.
    ///
    /// Nested containers are tracked on an explicit stack, so hostile nesting
    /// cannot exhaust the call stack, and runs of fixed-width elements are
    /// stepped over in one move. The cost is linear in the bytes skipped.
    /// Strings are skipped whatever their length, as long as the bytes are
    /// there. On error the position is left where it was.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if the value runs past the buffer
    /// - [`ProtocolError::NegativeLength`] for a negative string length
    /// - [`ProtocolError::UnknownType`] for a tag with no known layout
    /// - [`ProtocolError::SkipDepthExceeded`] past `max_depth` open containers
    pub fn skip_value(&mut self, tag: u8, max_depth: usize) -> WireResult<()> {
        let start = self.cursor.position();
        let mut stack = Vec::new();
        let result = self
            .skip_one(tag, &mut stack, max_depth)
            .and_then(|()| self.drain(&mut stack, max_depth));
        self.rewind_on_err(start, result)
    }

    fn skip_items(&mut self, tags: [u8; 2], items: u64) -> WireResult<()> {
        let max_depth = self.config.max_skip_depth;
        let start = self.cursor.position();
        let mut stack = Vec::new();
        let result = self
            .push_items(tags, items, &mut stack, max_depth)
            .and_then(|()| self.drain(&mut stack, max_depth));
        self.rewind_on_err(start, result)
    }

    fn skip_one(&mut self, tag: u8, stack: &mut Vec<Pending>, max_depth: usize) -> WireResult<()> {
        let wire_type = TypeTag::from_u8(tag).ok_or(ProtocolError::UnknownType(tag))?;

        match wire_type {
            TypeTag::Stop => Err(ProtocolError::UnknownType(tag)),
            TypeTag::Void => Ok(()),
            TypeTag::Bool | TypeTag::Byte => self.cursor.advance(1),
            TypeTag::I16 => self.cursor.advance(2),
            TypeTag::I32 => self.cursor.advance(4),
            TypeTag::Double | TypeTag::I64 => self.cursor.advance(8),
            TypeTag::String => self.cursor.skip_string(),
            TypeTag::Struct => push(stack, Pending::Struct, max_depth),
            TypeTag::Map => {
                let key_tag = self.cursor.read_u8()?;
                let value_tag = self.cursor.read_u8()?;
                let count = u64::try_from(self.cursor.read_i32()?).unwrap_or(0);
                self.push_items([key_tag, value_tag], count * 2, stack, max_depth)
            },
            TypeTag::Set | TypeTag::List => {
                let elem_tag = self.cursor.read_u8()?;
                let count = u64::try_from(self.cursor.read_i32()?).unwrap_or(0);
                self.push_items([elem_tag, elem_tag], count, stack, max_depth)
            },
        }
    }

    fn push_items(
        &mut self,
        tags: [u8; 2],
        items: u64,
        stack: &mut Vec<Pending>,
        max_depth: usize,
    ) -> WireResult<()> {
        if items == 0 {
            return Ok(());
        }

        let width = |tag: u8| TypeTag::from_u8(tag).and_then(TypeTag::fixed_width);
        if let (Some(first), Some(second)) = (width(tags[0]), width(tags[1])) {
            let pair = (first + second) as u64;
            let total = (items / 2) * pair + (items % 2) * first as u64;
            return self.cursor.advance(usize::try_from(total).unwrap_or(usize::MAX));
        }

        push(stack, Pending::Items { tags, remaining: items }, max_depth)
    }

    fn drain(&mut self, stack: &mut Vec<Pending>, max_depth: usize) -> WireResult<()> {
        while let Some(top) = stack.last_mut() {
            let tag = match top {
                Pending::Struct => {
                    let tag = self.cursor.read_u8()?;
                    if tag == TypeTag::Stop.to_u8() {
                        stack.pop();
                        continue;
                    }
                    self.cursor.read_i16()?;
                    tag
                },
                Pending::Items { tags, remaining } => {
                    if *remaining == 0 {
                        stack.pop();
                        continue;
                    }
                    // even counts are keys
                    let tag = tags[(*remaining % 2) as usize];
                    *remaining -= 1;
                    tag
                },
            };
            self.skip_one(tag, stack, max_depth)?;
        }
        Ok(())
    }
}

fn push(stack: &mut Vec<Pending>, pending: Pending, max_depth: usize) -> WireResult<()> {
    if stack.len() >= max_depth {
        return Err(ProtocolError::SkipDepthExceeded(max_depth));
    }
    stack.push(pending);
    Ok(())
}

impl std::fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("position", &self.cursor.position())
            .field("len", &self.cursor.len())
            .field("config", &self.config)
            .field("desync", &self.desync)
            .finish_non_exhaustive()
    }
}
