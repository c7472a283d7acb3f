//! Method name to struct type name tables.
//!
//! The known method family follows the convention `Foo` → `TFooReq` for calls
//! and `TFooResp` for replies.

/// Label reported for messages whose method belongs to the known family
pub const PROTOCOL_FAMILY: &str = "HiveServer2";

/// (method, request struct, response struct)
const METHODS: &[(&str, &str, &str)] = &[
    ("OpenSession", "TOpenSessionReq", "TOpenSessionResp"),
    ("CloseSession", "TCloseSessionReq", "TCloseSessionResp"),
    ("ExecuteStatement", "TExecuteStatementReq", "TExecuteStatementResp"),
    ("GetOperationStatus", "TGetOperationStatusReq", "TGetOperationStatusResp"),
    ("FetchResults", "TFetchResultsReq", "TFetchResultsResp"),
    ("CloseOperation", "TCloseOperationReq", "TCloseOperationResp"),
    ("CancelOperation", "TCancelOperationReq", "TCancelOperationResp"),
    ("GetResultSetMetadata", "TGetResultSetMetadataReq", "TGetResultSetMetadataResp"),
    ("GetSchemas", "TGetSchemasReq", "TGetSchemasResp"),
    ("GetTables", "TGetTablesReq", "TGetTablesResp"),
    ("GetColumns", "TGetColumnsReq", "TGetColumnsResp"),
    ("GetCatalogs", "TGetCatalogsReq", "TGetCatalogsResp"),
    ("GetTableTypes", "TGetTableTypesReq", "TGetTableTypesResp"),
    ("GetTypeInfo", "TGetTypeInfoReq", "TGetTypeInfoResp"),
];

fn lookup(method: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    METHODS.iter().find(|(name, _, _)| *name == method)
}

/// Struct type carrying the arguments of `method`
#[must_use]
pub fn request_struct_name(method: &str) -> Option<&'static str> {
    lookup(method).map(|(_, request, _)| *request)
}

/// Struct type carrying the result of `method`
#[must_use]
pub fn response_struct_name(method: &str) -> Option<&'static str> {
    lookup(method).map(|(_, _, response)| *response)
}

/// Returns true if `method` belongs to [`PROTOCOL_FAMILY`]
#[must_use]
pub fn is_known_method(method: &str) -> bool {
    lookup(method).is_some()
}

/// All known method names
pub fn known_methods() -> impl Iterator<Item = &'static str> {
    METHODS.iter().map(|(name, _, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_convention_holds() {
        for method in known_methods() {
            assert_eq!(request_struct_name(method), Some(format!("T{method}Req").as_str()));
            assert_eq!(response_struct_name(method), Some(format!("T{method}Resp").as_str()));
        }
    }

    #[test]
    fn lookups_are_case_sensitive() {
        assert!(is_known_method("GetTables"));
        assert!(!is_known_method("gettables"));
        assert_eq!(request_struct_name("executeStatement"), None);
    }
}
