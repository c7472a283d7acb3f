//! # rpcscope protocol: wire primitives
//!
//! This crate implements the byte-level layer of the legacy binary RPC format:
//! type tags, message kinds, a bounds-checked cursor over a buffered message,
//! and the message envelope in both of its historical encodings.
//!
//! ## Wire Format
//!
//! A message is an envelope followed by a single struct body:
//!
//! ```text
//! [envelope: method, kind, seq] [tag id value]* [STOP]
//! ```
//!
//! Every value is self-describing at the byte level (a type tag precedes it),
//! but field identifiers are bare numbers. Mapping them to names requires an
//! external schema, which lives in `rpcscope-core`.
//!
//! ## Security Properties
//!
//! - **Bounded Lengths**: string lengths above [`MAX_STRING_LEN`] are rejected
//!   before any bytes are copied.
//! - **No Overreads**: every read is checked against the remaining buffer and
//!   failed reads leave the cursor untouched.
//! - **No Unsafe**: big endian decoding goes through `zerocopy`'s byte-order
//!   types.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cursor;
pub mod envelope;
pub mod errors;
pub mod kind;
pub mod tags;

pub use cursor::{ByteCursor, MAX_STRING_LEN, text_or_preview};
pub use envelope::{Envelope, Framing};
pub use errors::{ProtocolError, Result};
pub use kind::MessageKind;
pub use tags::{TypeTag, tag_name};

/// Collections declaring more elements than this are not materialized
pub const MAX_COLLECTION_LEN: usize = 10_000;

/// Default maximum struct nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Smallest buffer that can hold the first header word
pub const MIN_MESSAGE_LEN: usize = 4;
