//! Snapshot tests for diagnostic output.
//!
//! These tests use insta inline snapshots. If the text layout changes, they
//! fail, so tooling that scrapes the output does not break silently.

use insta::assert_snapshot;
use rpcscope_core::{
    DecoderConfig, FormatConfig, decode_message, decode_message_with, format_message,
};
use rpcscope_harness::{MessageWriter, hive};
use rpcscope_proto::{MessageKind, TypeTag};

fn render(bytes: &[u8]) -> String {
    format_message(&decode_message(bytes), &FormatConfig::default())
}

#[test]
fn snapshot_execute_statement_resolved() {
    let registry = hive::hive_registry();
    let bytes = hive::execute_statement_call(12345, "SELECT 1");
    let result = decode_message_with(&bytes, Some(&registry), &DecoderConfig::default());

    assert_snapshot!(format_message(&result, &FormatConfig::default()), @r#"
Method: ExecuteStatement
Type: CALL
Sequence: 12345
Bytes: 148/148
Protocol: HiveServer2
Field Names: Resolved via TExecuteStatementReq (7 mappings)
Fields (5):
  confOverlay [id=3] (MAP): {"spark.sql.adaptive.enabled": "true"}
  queryTimeout [id=5] (I64): 30
  runAsync [id=4] (BOOL): true
  sessionHandle [id=1] (STRUCT): {sessionHandle: {sessionHandle: "guid-0001", statement: "secret-0001"}}
  statement [id=2] (STRING): SELECT 1
"#);
}

#[test]
fn snapshot_execute_statement_generic() {
    let bytes = hive::execute_statement_call(12345, "SELECT 1");

    assert_snapshot!(render(&bytes), @r#"
Method: ExecuteStatement
Type: CALL
Sequence: 12345
Bytes: 148/148
Protocol: HiveServer2
Field Names: Generic (no schema registry attached)
Fields (5):
  field_1 [id=1] (STRUCT): {field_1: {field_1: "guid-0001", field_2: "secret-0001"}}
  field_2 [id=2] (STRING): SELECT 1
  field_3 [id=3] (MAP): {"spark.sql.adaptive.enabled": "true"}
  field_4 [id=4] (BOOL): true
  field_5 [id=5] (I64): 30
"#);
}

#[test]
fn snapshot_truncated_string() {
    let mut writer = MessageWriter::strict("GetTables", MessageKind::Call, 1);
    writer.field(TypeTag::I32, 1).i32(7);
    writer.field(TypeTag::String, 2).length(100).raw(b"short");

    assert_snapshot!(render(&writer.finish()), @r"
Method: GetTables
Type: CALL
Sequence: 1
Bytes: 31/40
Protocol: HiveServer2
Field Names: Generic (no schema registry attached)
Fields (2):
  field_1 [id=1] (I32): 7
  field_2 [id=2] (STRING): <error: unexpected end of buffer at offset 35: needed 100 bytes, 5 available>
  <incomplete: abandoned after field 2: unexpected end of buffer at offset 35: needed 100 bytes, 5 available>
");
}

#[test]
fn snapshot_placeholders() {
    let mut writer = MessageWriter::strict("Frobnicate", MessageKind::OneWay, -1);
    writer.field(TypeTag::List, 1).list_begin(TypeTag::I64, 20_000).raw(&[0; 160_000]);
    writer.field(TypeTag::Set, 2).set_begin(TypeTag::I16, 2).i16(1).i16(2);
    writer.field(TypeTag::Double, 3).double(0.5);
    writer.field(TypeTag::Byte, 4).byte(-3).stop();

    assert_snapshot!(render(&writer.finish()), @r"
Method: Frobnicate
Type: ONEWAY
Sequence: -1
Bytes: 160058/160058
Field Names: Generic (no schema registry attached)
Fields (4):
  field_1 [id=1] (LIST): <large_list: 20000 entries>
  field_2 [id=2] (SET): {1, 2}
  field_3 [id=3] (DOUBLE): 0.5
  field_4 [id=4] (BYTE): -3
");
}

#[test]
fn snapshot_decode_error() {
    assert_snapshot!(render(&[0x80, 0x02, 0x00, 0x01, 0, 0, 0, 0]), @"<decode error: framing error at byte 4 of 8: unsupported protocol version: 0x80020000>");
}
