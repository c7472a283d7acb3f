//! rpcscope core: schema-optional message decoding
//!
//! This crate turns a buffered binary RPC message into a decoded tree without
//! needing compiled interface definitions, and optionally names the fields
//! from a schema registry. It performs no I/O.
//!
//! # Data Flow
//!
//! ```text
//!  raw bytes
//!     │
//!     ▼
//! ┌──────────────┐   method, kind   ┌───────────────────┐
//! │ Envelope     │ ───────────────► │ FieldNameResolver │ ◄── SchemaRegistry
//! │ (proto)      │                  │ id → name table   │     (optional)
//! └──────────────┘                  └───────────────────┘
//!     │                                      │
//!     ▼                                      ▼
//! ┌──────────────────────────────────────────────┐
//! │ Decoder: struct body, bounded depth and size │
//! └──────────────────────────────────────────────┘
//!     │
//!     ▼
//!  DecodedMessage ──► format_message (diagnostics)
//! ```
//!
//! # Key Principles
//!
//! - Best effort: only a broken envelope fails a decode. Bad fields are
//!   recorded as errors and skipped; their siblings still decode.
//! - Bounded: nesting depth, collection sizes and string lengths are capped
//!   before anything is allocated.
//! - Names are cosmetic: a schema only renames fields, it never changes how
//!   bytes are read.
//!
//! # Modules
//!
//! - [`decoder`]: struct body decoding and value skipping
//! - [`schema`]: schema registries and field name resolution
//! - [`value`]: the decoded tree
//! - [`format`]: diagnostic text output
//! - [`error`]: fatal decode errors

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decoder;
pub mod error;
pub mod format;
pub mod schema;
pub mod value;

pub use decoder::{Decoder, DecoderConfig};
pub use error::DecodeError;
pub use format::{FormatConfig, format_decoded, format_message};
pub use schema::{
    FieldDescriptor, FieldNameMap, FieldNameResolver, SchemaRegistry, StaticRegistry,
};
pub use value::{
    CollectionKind, DecodedMessage, FieldNames, FieldValue, Fields, GenericReason, Placeholder,
    Value,
};

/// Decode a message with default limits and generic field names.
///
/// # Errors
///
/// See [`Decoder::decode_message`].
pub fn decode_message(bytes: &[u8]) -> Result<DecodedMessage, DecodeError> {
    decode_message_with(bytes, None, &DecoderConfig::default())
}

/// Decode a message, naming fields through `registry` if one is given.
///
/// # Errors
///
/// See [`Decoder::decode_message`].
pub fn decode_message_with(
    bytes: &[u8],
    registry: Option<&dyn SchemaRegistry>,
    config: &DecoderConfig,
) -> Result<DecodedMessage, DecodeError> {
    Decoder::new(bytes, config.clone()).decode_message(registry)
}
