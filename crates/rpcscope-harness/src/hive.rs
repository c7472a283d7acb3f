//! HiveServer2 schema fixture and sample messages.
//!
//! Descriptors mirror the generated `TCLIService` types for the structs the
//! samples use, including the vendor extension fields numbered from `0x501`.

use bytes::Bytes;
use rpcscope_core::{FieldDescriptor, StaticRegistry};
use rpcscope_proto::{MessageKind, TypeTag};

use crate::{MessageWriter, WireValue, wire_value::write_struct};

/// Registry with the request and response schemas used by the samples
#[must_use]
pub fn hive_registry() -> StaticRegistry {
    use TypeTag::{Bool, I16, I32, I64, Map, String, Struct};

    StaticRegistry::new()
        .with_struct(
            "TOpenSessionReq",
            vec![
                FieldDescriptor::new(1, I32, "client_protocol"),
                FieldDescriptor::new(2, String, "username"),
                FieldDescriptor::new(3, String, "password"),
                FieldDescriptor::new(4, Map, "configuration"),
            ],
        )
        .with_struct(
            "TOpenSessionResp",
            vec![
                FieldDescriptor::new(1, Struct, "status"),
                FieldDescriptor::new(2, I32, "serverProtocolVersion"),
                FieldDescriptor::new(3, Struct, "sessionHandle"),
                FieldDescriptor::new(4, Map, "configuration"),
            ],
        )
        .with_struct("TCloseSessionReq", vec![FieldDescriptor::new(1, Struct, "sessionHandle")])
        .with_struct("TCloseSessionResp", vec![FieldDescriptor::new(1, Struct, "status")])
        .with_struct(
            "TExecuteStatementReq",
            vec![
                FieldDescriptor::new(1, Struct, "sessionHandle"),
                FieldDescriptor::new(2, String, "statement"),
                FieldDescriptor::new(3, Map, "confOverlay"),
                FieldDescriptor::new(4, Bool, "runAsync"),
                FieldDescriptor::new(5, I64, "queryTimeout"),
                FieldDescriptor::new(0x501, Struct, "getDirectResults"),
                FieldDescriptor::new(0x502, Bool, "canReadArrowResult"),
            ],
        )
        .with_struct(
            "TExecuteStatementResp",
            vec![
                FieldDescriptor::new(1, Struct, "status"),
                FieldDescriptor::new(2, Struct, "operationHandle"),
                FieldDescriptor::new(0x501, Struct, "directResults"),
            ],
        )
        .with_struct(
            "TGetOperationStatusReq",
            vec![
                FieldDescriptor::new(1, Struct, "operationHandle"),
                FieldDescriptor::new(2, Bool, "getProgressUpdate"),
            ],
        )
        .with_struct(
            "TFetchResultsReq",
            vec![
                FieldDescriptor::new(1, Struct, "operationHandle"),
                FieldDescriptor::new(2, I32, "orientation"),
                FieldDescriptor::new(3, I64, "maxRows"),
                FieldDescriptor::new(4, I16, "fetchType"),
            ],
        )
        .with_struct(
            "TFetchResultsResp",
            vec![
                FieldDescriptor::new(1, Struct, "status"),
                FieldDescriptor::new(2, Bool, "hasMoreRows"),
                FieldDescriptor::new(3, Struct, "results"),
            ],
        )
        .with_struct("TCloseOperationReq", vec![FieldDescriptor::new(1, Struct, "operationHandle")])
}

fn handle_identifier(guid: &str, secret: &str) -> WireValue {
    WireValue::Struct(vec![(1, WireValue::text(guid)), (2, WireValue::text(secret))])
}

/// Body of a `TExecuteStatementReq`
#[must_use]
pub fn execute_statement_fields(statement: &str) -> Vec<(i16, WireValue)> {
    vec![
        (1, WireValue::Struct(vec![(1, handle_identifier("guid-0001", "secret-0001"))])),
        (2, WireValue::text(statement)),
        (
            3,
            WireValue::Map {
                key: TypeTag::String,
                value: TypeTag::String,
                entries: vec![(
                    WireValue::text("spark.sql.adaptive.enabled"),
                    WireValue::text("true"),
                )],
            },
        ),
        (4, WireValue::Bool(true)),
        (5, WireValue::I64(30)),
    ]
}

/// Body of a `TFetchResultsReq` for the operation `guid`
#[must_use]
pub fn fetch_results_fields(guid: &str) -> Vec<(i16, WireValue)> {
    let operation_handle = WireValue::Struct(vec![
        (1, handle_identifier(guid, "secret-0002")),
        (2, WireValue::I32(0)),
        (3, WireValue::Bool(true)),
    ]);
    vec![(1, operation_handle), (2, WireValue::I32(0)), (3, WireValue::I64(10_000))]
}

/// Body of a successful `TExecuteStatementResp`
#[must_use]
pub fn execute_statement_reply_fields() -> Vec<(i16, WireValue)> {
    let status = WireValue::Struct(vec![
        (1, WireValue::I32(0)),
        (
            2,
            WireValue::List {
                elem: TypeTag::String,
                items: vec![WireValue::text("Query executed successfully")],
            },
        ),
    ]);
    let operation_handle = WireValue::Struct(vec![
        (1, handle_identifier("guid-0003", "secret-0003")),
        (2, WireValue::I32(0)),
        (3, WireValue::Bool(true)),
    ]);
    vec![(1, status), (2, operation_handle)]
}

/// Complete strict-framed message
#[must_use]
pub fn message(
    method: &str,
    kind: MessageKind,
    sequence_id: i32,
    fields: &[(i16, WireValue)],
) -> Bytes {
    let mut writer = MessageWriter::strict(method, kind, sequence_id);
    write_struct(&mut writer, fields);
    writer.finish()
}

/// `ExecuteStatement` call carrying `statement`
#[must_use]
pub fn execute_statement_call(sequence_id: i32, statement: &str) -> Bytes {
    message("ExecuteStatement", MessageKind::Call, sequence_id, &execute_statement_fields(statement))
}

/// `FetchResults` call for the operation `guid`
#[must_use]
pub fn fetch_results_call(sequence_id: i32, guid: &str) -> Bytes {
    message("FetchResults", MessageKind::Call, sequence_id, &fetch_results_fields(guid))
}
