//! Values with a known encoding and a known decoded form.
//!
//! A [`WireValue`] is what a test wants to put on the wire. It knows its
//! type tag, how to write itself through a [`MessageWriter`] and which
//! [`Value`] the decoder must produce for it.

use rpcscope_core::{FieldNameMap, FieldValue, Fields, Value};
use rpcscope_proto::TypeTag;

use crate::MessageWriter;

/// A value to encode
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// `BOOL`
    Bool(bool),
    /// `BYTE`
    Byte(i8),
    /// `I16`
    I16(i16),
    /// `I32`
    I32(i32),
    /// `I64`
    I64(i64),
    /// `DOUBLE`
    Double(f64),
    /// `STRING`
    Text(String),
    /// `STRUCT`, fields in wire order
    Struct(Vec<(i16, WireValue)>),
    /// `MAP` with declared key and value tags
    Map {
        /// Declared key tag
        key: TypeTag,
        /// Declared value tag
        value: TypeTag,
        /// Entries in wire order
        entries: Vec<(WireValue, WireValue)>,
    },
    /// `SET` with a declared element tag
    Set {
        /// Declared element tag
        elem: TypeTag,
        /// Elements in wire order
        items: Vec<WireValue>,
    },
    /// `LIST` with a declared element tag
    List {
        /// Declared element tag
        elem: TypeTag,
        /// Elements in wire order
        items: Vec<WireValue>,
    },
}

impl WireValue {
    /// Type tag this value is written under
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Bool,
            Self::Byte(_) => TypeTag::Byte,
            Self::I16(_) => TypeTag::I16,
            Self::I32(_) => TypeTag::I32,
            Self::I64(_) => TypeTag::I64,
            Self::Double(_) => TypeTag::Double,
            Self::Text(_) => TypeTag::String,
            Self::Struct(_) => TypeTag::Struct,
            Self::Map { .. } => TypeTag::Map,
            Self::Set { .. } => TypeTag::Set,
            Self::List { .. } => TypeTag::List,
        }
    }

    /// Shorthand for a text value
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Write the value body (no field header)
    pub fn write(&self, writer: &mut MessageWriter) {
        match self {
            Self::Bool(v) => {
                writer.bool(*v);
            },
            Self::Byte(v) => {
                writer.byte(*v);
            },
            Self::I16(v) => {
                writer.i16(*v);
            },
            Self::I32(v) => {
                writer.i32(*v);
            },
            Self::I64(v) => {
                writer.i64(*v);
            },
            Self::Double(v) => {
                writer.double(*v);
            },
            Self::Text(v) => {
                writer.string(v);
            },
            Self::Struct(fields) => write_struct(writer, fields),
            Self::Map { key, value, entries } => {
                writer.map_begin(*key, *value, entries.len() as i32);
                for (k, v) in entries {
                    k.write(writer);
                    v.write(writer);
                }
            },
            Self::Set { elem, items } => {
                writer.set_begin(*elem, items.len() as i32);
                items.iter().for_each(|item| item.write(writer));
            },
            Self::List { elem, items } => {
                writer.list_begin(*elem, items.len() as i32);
                items.iter().for_each(|item| item.write(writer));
            },
        }
    }

    /// Decoded form, with struct keys taken from `names`
    #[must_use]
    pub fn expected(&self, names: &FieldNameMap) -> Value {
        match self {
            Self::Bool(v) => Value::Bool(*v),
            Self::Byte(v) => Value::I8(*v),
            Self::I16(v) => Value::I16(*v),
            Self::I32(v) => Value::I32(*v),
            Self::I64(v) => Value::I64(*v),
            Self::Double(v) => Value::Double(*v),
            Self::Text(v) => Value::Text(v.clone()),
            Self::Struct(fields) => Value::Struct(expected_fields(fields, names)),
            Self::Map { entries, .. } => Value::Map(
                entries.iter().map(|(k, v)| (k.expected(names), v.expected(names))).collect(),
            ),
            Self::Set { items, .. } => Value::Set(items.iter().map(|i| i.expected(names)).collect()),
            Self::List { items, .. } => {
                Value::List(items.iter().map(|i| i.expected(names)).collect())
            },
        }
    }
}

/// Write struct fields followed by STOP
pub fn write_struct(writer: &mut MessageWriter, fields: &[(i16, WireValue)]) {
    for (id, value) in fields {
        writer.field(value.tag(), *id);
        value.write(writer);
    }
    writer.stop();
}

/// Decoded form of a struct body
#[must_use]
pub fn expected_fields(fields: &[(i16, WireValue)], names: &FieldNameMap) -> Fields {
    fields
        .iter()
        .map(|(id, value)| {
            let field = FieldValue::decoded(value.tag().to_u8(), *id, value.expected(names));
            (names.key_for(*id), field)
        })
        .collect()
}
