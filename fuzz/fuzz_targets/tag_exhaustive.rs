//! Exhaustive tag and count fuzzer for struct bodies
//!
//! Random bodies rarely hit a collection header with a boundary count. This
//! fuzzer writes every tag byte, as a field and as a collection element,
//! with edge-case counts in front of the fuzz input, and checks that decoding
//! stays in bounds for every combination.

#![no_main]

use libfuzzer_sys::fuzz_target;
use rpcscope_core::decode_message;
use rpcscope_harness::MessageWriter;
use rpcscope_proto::{MessageKind, TypeTag};

// Element counts around the limits
const COUNTS: &[i32] = &[i32::MIN, -1, 0, 1, 2, 9_999, 10_000, 10_001, i32::MAX];

const COLLECTIONS: &[TypeTag] = &[TypeTag::Map, TypeTag::Set, TypeTag::List];

fn check(bytes: &[u8]) {
    if let Ok(decoded) = decode_message(bytes) {
        assert!(decoded.bytes_consumed <= bytes.len());
    }
}

fuzz_target!(|data: &[u8]| {
    for tag in 0..=u8::MAX {
        let mut writer = MessageWriter::strict("FetchResults", MessageKind::Reply, 0);
        writer.field_raw(tag, 1).raw(data);
        check(&writer.finish());

        for &collection in COLLECTIONS {
            for &count in COUNTS {
                let mut writer = MessageWriter::strict("FetchResults", MessageKind::Reply, 0);
                writer.field(collection, 1).raw(&[tag]);
                if collection == TypeTag::Map {
                    writer.raw(&[tag]);
                }
                writer.length(count).raw(data);
                check(&writer.finish());
            }
        }
    }
});
