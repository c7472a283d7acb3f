//! Test harness for the rpcscope decoder.
//!
//! Provides a reference encoder ([`MessageWriter`]), encodable values with
//! their expected decoded form ([`WireValue`]) and a HiveServer2 schema
//! fixture with sample messages ([`hive`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod hive;
pub mod wire_value;
pub mod writer;

pub use hive::hive_registry;
pub use wire_value::WireValue;
pub use writer::MessageWriter;
