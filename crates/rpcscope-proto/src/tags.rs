//! Wire type tags.
//!
//! Every field and every collection element on the wire is preceded (directly
//! or through its collection header) by a one-byte type tag describing how the
//! following bytes are laid out.
//!
//! # Gaps
//!
//! Tag values 5, 7 and 9 were never assigned. They are not valid tags and are
//! reported as unknown, but the numbering of the assigned tags must never be
//! compacted around them.

use std::borrow::Cow;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Wire type tags
///
/// The `#[repr(u8)]` keeps the numeric values stable for wire compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TypeTag {
    /// End of struct marker
    Stop = 0,
    /// No value, occupies zero bytes
    Void = 1,
    /// One byte, non-zero is true
    Bool = 2,
    /// Signed 8-bit integer
    Byte = 3,
    /// IEEE-754 64-bit float, big endian
    Double = 4,
    /// Signed 16-bit integer, big endian
    I16 = 6,
    /// Signed 32-bit integer, big endian
    I32 = 8,
    /// Signed 64-bit integer, big endian
    I64 = 10,
    /// Length-prefixed bytes, usually UTF-8
    String = 11,
    /// Nested struct terminated by [`TypeTag::Stop`]
    Struct = 12,
    /// Key tag, value tag, count, then count pairs
    Map = 13,
    /// Element tag, count, then count elements
    Set = 14,
    /// Element tag, count, then count elements
    List = 15,
}

impl TypeTag {
    /// Convert to raw u8 value
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from raw u8 value
    ///
    /// Returns `None` for the unassigned gaps (5, 7, 9) and anything above 15.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Stop),
            1 => Some(Self::Void),
            2 => Some(Self::Bool),
            3 => Some(Self::Byte),
            4 => Some(Self::Double),
            6 => Some(Self::I16),
            8 => Some(Self::I32),
            10 => Some(Self::I64),
            11 => Some(Self::String),
            12 => Some(Self::Struct),
            13 => Some(Self::Map),
            14 => Some(Self::Set),
            15 => Some(Self::List),
            _ => None,
        }
    }

    /// Upper-case display name used in diagnostics
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stop => "STOP",
            Self::Void => "VOID",
            Self::Bool => "BOOL",
            Self::Byte => "BYTE",
            Self::Double => "DOUBLE",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::String => "STRING",
            Self::Struct => "STRUCT",
            Self::Map => "MAP",
            Self::Set => "SET",
            Self::List => "LIST",
        }
    }

    /// Encoded width of a value of this type, if it does not depend on the
    /// value itself.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Void => Some(0),
            Self::Bool | Self::Byte => Some(1),
            Self::I16 => Some(2),
            Self::I32 => Some(4),
            Self::Double | Self::I64 => Some(8),
            Self::Stop | Self::String | Self::Struct | Self::Map | Self::Set | Self::List => None,
        }
    }
}

/// Display name for a raw tag byte, falling back to `type_<n>` for tags that
/// are not assigned.
#[must_use]
pub fn tag_name(raw: u8) -> Cow<'static, str> {
    match TypeTag::from_u8(raw) {
        Some(tag) => Cow::Borrowed(tag.name()),
        None => Cow::Owned(format!("type_{raw}")),
    }
}
