//! Random input fuzzer for message decoding
//!
//! Feeds arbitrary bytes through the full pipeline (envelope, name
//! resolution, body, formatting) with the HiveServer2 registry attached, so
//! named and generic paths are both reached.

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use rpcscope_core::{
    DecoderConfig, FormatConfig, StaticRegistry, decode_message_with, format_message,
};

static REGISTRY: OnceLock<StaticRegistry> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let registry = REGISTRY.get_or_init(rpcscope_harness::hive_registry);
    let result = decode_message_with(data, Some(registry), &DecoderConfig::default());

    if let Ok(decoded) = &result {
        assert!(decoded.bytes_consumed <= data.len());
        assert_eq!(decoded.total_bytes, data.len());
    }

    let _ = format_message(&result, &FormatConfig::default());
});
