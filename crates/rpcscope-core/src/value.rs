//! Decoded message tree.
//!
//! The tree mirrors the wire: field order is wire order, map entries are kept
//! as pairs (keys may be structs and may repeat), and every field records the
//! type tag that was actually read, never the one a schema declares.

use std::{borrow::Cow, collections::HashMap, fmt};

use rpcscope_proto::{Framing, MessageKind, TypeTag, tag_name};
use serde::Serialize;

/// Which kind of collection a placeholder stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollectionKind {
    /// `MAP`
    Map,
    /// `SET`
    Set,
    /// `LIST`
    List,
}

impl CollectionKind {
    fn label(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Set => "set",
            Self::List => "list",
        }
    }
}

/// Stand-in for a value the decoder deliberately did not materialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Placeholder {
    /// A `VOID` value (carries no bytes)
    Void,
    /// Declared element count above the collection ceiling
    OversizedCollection {
        /// Collection type
        kind: CollectionKind,
        /// Count found on the wire
        len: i32,
    },
    /// Collection within the ceiling, but the message already holds as many
    /// elements as the decoder will materialize
    ElementBudgetExhausted {
        /// Collection type
        kind: CollectionKind,
        /// Count found on the wire
        len: i32,
    },
    /// Tag byte that is not an assigned type
    UnknownType(u8),
    /// Nesting limit reached
    DepthExceeded,
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("<void>"),
            Self::OversizedCollection { kind, len } => {
                write!(f, "<large_{}: {} entries>", kind.label(), len)
            },
            Self::ElementBudgetExhausted { kind, len } => {
                write!(f, "<{}: {} entries, element budget exhausted>", kind.label(), len)
            },
            Self::UnknownType(tag) => write!(f, "<unknown_type:{tag}>"),
            Self::DepthExceeded => f.write_str("<max_depth_exceeded>"),
        }
    }
}

/// A decoded value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// `BOOL`
    Bool(bool),
    /// `BYTE`
    I8(i8),
    /// `I16`
    I16(i16),
    /// `I32`
    I32(i32),
    /// `I64`
    I64(i64),
    /// `DOUBLE`
    Double(f64),
    /// `STRING`: UTF-8 text, or a `<binary:...>` preview
    Text(String),
    /// `STRUCT`
    Struct(Fields),
    /// `MAP`, in encounter order, duplicates kept
    Map(Vec<(Value, Value)>),
    /// `SET`, in encounter order
    Set(Vec<Value>),
    /// `LIST`
    List(Vec<Value>),
    /// Value that was not materialized
    Placeholder(Placeholder),
}

impl Value {
    /// Nested fields, if this is a struct
    #[must_use]
    pub fn as_struct(&self) -> Option<&Fields> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Text content, if this is a string
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer content widened to i64, if this is any integer type
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I8(v) => Some(i64::from(v)),
            Self::I16(v) => Some(i64::from(v)),
            Self::I32(v) => Some(i64::from(v)),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for [`Value::Placeholder`]
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    // Text is quoted when nested so that `{a: "1"}` and `{a: 1}` differ.
    fn write_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

fn write_seq<'v>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    close: &str,
    items: impl Iterator<Item = &'v Value>,
) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.write_nested(f)?;
    }
    f.write_str(close)
}

/// Compact single-line rendering: `{key: value}` for structs and maps, `{a}`
/// for sets, `[a]` for lists.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(text) => f.write_str(text),
            Self::Struct(fields) => fmt::Display::fmt(fields, f),
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.write_nested(f)?;
                    f.write_str(": ")?;
                    value.write_nested(f)?;
                }
                f.write_str("}")
            },
            Self::Set(items) => write_seq(f, "{", "}", items.iter()),
            Self::List(items) => write_seq(f, "[", "]", items.iter()),
            Self::Placeholder(placeholder) => fmt::Display::fmt(placeholder, f),
        }
    }
}

/// One decoded struct field.
///
/// # Invariants
///
/// Exactly one of `value` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    /// Type tag byte read from the wire
    pub type_tag: u8,
    /// Field identifier as transmitted
    pub field_id: i16,
    /// Decoded value, absent if decoding failed
    pub value: Option<Value>,
    /// Why decoding failed, if it did
    pub error: Option<String>,
}

impl FieldValue {
    /// A successfully decoded field
    #[must_use]
    pub fn decoded(type_tag: u8, field_id: i16, value: Value) -> Self {
        Self { type_tag, field_id, value: Some(value), error: None }
    }

    /// A field whose value could not be decoded
    #[must_use]
    pub fn failed(type_tag: u8, field_id: i16, error: impl Into<String>) -> Self {
        Self { type_tag, field_id, value: None, error: Some(error.into()) }
    }

    /// The wire type, if the tag is assigned
    #[must_use]
    pub fn wire_type(&self) -> Option<TypeTag> {
        TypeTag::from_u8(self.type_tag)
    }

    /// Display name of the wire type (`STRING`, `type_7`, ...)
    #[must_use]
    pub fn type_name(&self) -> Cow<'static, str> {
        tag_name(self.type_tag)
    }

    /// Returns true if the value decoded
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Ordered struct fields keyed by resolved name or `field_<id>`.
///
/// Behaves like an insertion-ordered map: inserting a key that is already
/// present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    incomplete: Option<String>,
}

impl Fields {
    /// Create an empty field list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, keeping first-seen position
    pub fn insert(&mut self, key: String, field: FieldValue) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = field,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, field));
            },
        }
    }

    /// Record why decoding of this struct stopped before its STOP tag
    pub fn mark_incomplete(&mut self, reason: impl Into<String>) {
        self.incomplete = Some(reason.into());
    }

    /// Why decoding stopped early, if it did
    #[must_use]
    pub fn incomplete(&self) -> Option<&str> {
        self.incomplete.as_deref()
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(key, field)| (key.as_str(), field))
    }

    /// Field keys in wire order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Look up a field by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        let slot = *self.index.get(key)?;
        self.entries.get(slot).map(|(_, field)| field)
    }

    /// Look up a field by wire identifier
    #[must_use]
    pub fn get_by_id(&self, field_id: i16) -> Option<&FieldValue> {
        self.entries.iter().find(|(_, field)| field.field_id == field_id).map(|(_, field)| field)
    }

    /// Follow a chain of keys through nested structs.
    ///
    /// `get_path(&["operationHandle", "operationId", "guid"])` returns the
    /// `guid` field of the struct stored under `operationId`, itself inside
    /// `operationHandle`. Returns `None` if any step is missing or is not a
    /// struct.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&FieldValue> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.get(key)?.value.as_ref()?.as_struct()?;
        }
        current.get(last)
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (key, field) in iter {
            fields.insert(key, field);
        }
        fields
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, field)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: ")?;
            match (&field.value, &field.error) {
                (Some(value), _) => value.write_nested(f)?,
                (None, Some(error)) => write!(f, "<error: {error}>")?,
                (None, None) => f.write_str("<no value>")?,
            }
        }
        if let Some(reason) = &self.incomplete {
            if !self.entries.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "<incomplete: {reason}>")?;
        }
        f.write_str("}")
    }
}

/// Why field names could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenericReason {
    /// Decoding ran without a schema registry
    NoRegistry,
    /// The registry has nothing for this method and message kind
    NoMapping,
}

/// Outcome of field name resolution for a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldNames {
    /// Names came from the schema of `struct_name`
    Resolved {
        /// Struct type whose descriptors were used
        struct_name: &'static str,
        /// Number of id to name mappings available
        mappings: usize,
    },
    /// Keys are synthetic `field_<id>` names
    Generic(GenericReason),
}

impl FieldNames {
    /// Returns true if a schema supplied names
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Result of decoding one message.
///
/// Constructed once per decode and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedMessage {
    /// Method name from the envelope
    pub method: String,
    /// Message kind from the envelope
    pub kind: MessageKind,
    /// Sequence id from the envelope
    pub sequence_id: i32,
    /// Header encoding
    pub framing: Framing,
    /// Top-level struct body
    pub fields: Fields,
    /// Bytes consumed by the decode
    pub bytes_consumed: usize,
    /// Length of the input buffer
    pub total_bytes: usize,
    /// Protocol family, if the method belongs to a known one
    pub protocol: Option<&'static str>,
    /// How field keys were produced
    pub field_names: FieldNames,
}

impl DecodedMessage {
    /// Look up a top-level field by key
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns true if every input byte was consumed
    #[must_use]
    pub fn is_fully_consumed(&self) -> bool {
        self.bytes_consumed == self.total_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn field(id: i16, value: Value) -> FieldValue {
        let tag = match &value {
            Value::Text(_) => TypeTag::String,
            Value::Struct(_) => TypeTag::Struct,
            _ => TypeTag::I32,
        };
        FieldValue::decoded(tag.to_u8(), id, value)
    }

    #[test]
    fn insert_keeps_first_position() {
        let mut fields = Fields::new();
        fields.insert("a".into(), field(1, Value::I32(1)));
        fields.insert("b".into(), field(2, Value::I32(2)));
        fields.insert("a".into(), field(1, Value::I32(3)));

        assert_eq!(fields.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(fields.get("a").and_then(|f| f.value.clone()), Some(Value::I32(3)));
    }

    #[test]
    fn get_path_descends_structs() {
        let inner: Fields = [("guid".to_string(), field(1, text("abc")))].into_iter().collect();
        let middle: Fields =
            [("operationId".to_string(), field(1, Value::Struct(inner)))].into_iter().collect();
        let outer: Fields =
            [("operationHandle".to_string(), field(1, Value::Struct(middle)))].into_iter().collect();

        let guid = outer.get_path(&["operationHandle", "operationId", "guid"]);
        assert_eq!(guid.and_then(|f| f.value.as_ref()).and_then(Value::as_text), Some("abc"));
        assert!(outer.get_path(&["operationHandle", "missing"]).is_none());
        assert!(outer.get_path(&["operationHandle", "operationId", "guid", "deeper"]).is_none());
        assert!(outer.get_path(&[]).is_none());
    }

    #[test]
    fn many_distinct_keys_stay_ordered_and_indexed() {
        let fields: Fields = (0..50_000)
            .map(|id| (format!("field_{id}"), field(id as i16, Value::I32(id))))
            .collect();

        assert_eq!(fields.len(), 50_000);
        assert_eq!(fields.keys().next(), Some("field_0"));
        assert_eq!(fields.keys().last(), Some("field_49999"));
        assert_eq!(fields.get("field_31337").map(|f| f.field_id), Some(31337));
        assert!(fields.get("field_50000").is_none());
    }

    #[test]
    fn get_by_id() {
        let fields: Fields = [("statement".to_string(), field(2, text("SELECT 1")))]
            .into_iter()
            .collect();
        assert!(fields.get_by_id(2).is_some());
        assert!(fields.get_by_id(1).is_none());
    }

    #[test]
    fn display_nested_values() {
        let inner: Fields = [("x".to_string(), field(1, text("y")))].into_iter().collect();
        let value = Value::Map(vec![
            (text("k"), Value::Struct(inner)),
            (Value::I32(1), Value::List(vec![Value::Bool(true), text("s")])),
        ]);
        assert_eq!(value.to_string(), r#"{"k": {x: "y"}, 1: [true, "s"]}"#);
        assert_eq!(Value::Set(vec![Value::I16(1), Value::I16(2)]).to_string(), "{1, 2}");
        assert_eq!(text("top level").to_string(), "top level");
    }

    #[test]
    fn display_failed_and_incomplete_fields() {
        let mut fields = Fields::new();
        fields.insert("field_4".into(), FieldValue::failed(11, 4, "boom"));
        fields.mark_incomplete("stopped");
        assert_eq!(fields.to_string(), "{field_4: <error: boom>, <incomplete: stopped>}");
    }

    #[test]
    fn placeholder_labels() {
        let oversized = Placeholder::OversizedCollection { kind: CollectionKind::List, len: 50_000 };
        assert_eq!(oversized.to_string(), "<large_list: 50000 entries>");
        let budget = Placeholder::ElementBudgetExhausted { kind: CollectionKind::Set, len: 500 };
        assert_eq!(budget.to_string(), "<set: 500 entries, element budget exhausted>");
        assert_eq!(Placeholder::UnknownType(7).to_string(), "<unknown_type:7>");
        assert_eq!(Placeholder::DepthExceeded.to_string(), "<max_depth_exceeded>");
    }

    #[test]
    fn field_value_type_names() {
        assert_eq!(FieldValue::failed(9, 1, "x").type_name(), "type_9");
        assert_eq!(field(1, text("a")).type_name(), "STRING");
        assert_eq!(field(1, text("a")).wire_type(), Some(TypeTag::String));
    }
}
