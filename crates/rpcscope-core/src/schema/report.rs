//! Schema consistency checks.
//!
//! Field ids must be unique within a struct, otherwise name resolution is
//! ambiguous. Vendor extension fields are numbered from
//! [`EXTENSION_FIELD_BASE`] upwards so they never collide with the standard
//! ones; the report lists them separately.

use std::collections::BTreeMap;

use serde::Serialize;

use super::FieldDescriptor;

/// First field id reserved for vendor extensions (`0x501`)
pub const EXTENSION_FIELD_BASE: i16 = 0x501;

/// Result of checking one struct schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// Struct type name
    pub struct_name: String,
    /// Number of descriptors
    pub field_count: usize,
    /// Ids that appear more than once, ascending
    pub duplicate_ids: Vec<i16>,
    /// Ids at or above [`EXTENSION_FIELD_BASE`], ascending
    pub extension_ids: Vec<i16>,
}

impl SchemaReport {
    /// Returns true if no id is repeated
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.duplicate_ids.is_empty()
    }
}

/// Check a struct's descriptors for repeated ids and list its extension ids.
#[must_use]
pub fn check_descriptors(struct_name: &str, descriptors: &[FieldDescriptor]) -> SchemaReport {
    let mut counts: BTreeMap<i16, usize> = BTreeMap::new();
    for descriptor in descriptors {
        *counts.entry(descriptor.field_id).or_default() += 1;
    }

    let duplicate_ids = counts.iter().filter(|(_, n)| **n > 1).map(|(id, _)| *id).collect();
    let extension_ids = counts.keys().copied().filter(|id| *id >= EXTENSION_FIELD_BASE).collect();

    SchemaReport {
        struct_name: struct_name.to_owned(),
        field_count: descriptors.len(),
        duplicate_ids,
        extension_ids,
    }
}

#[cfg(test)]
mod tests {
    use rpcscope_proto::TypeTag;

    use super::*;

    #[test]
    fn clean_schema() {
        let report = check_descriptors(
            "TFetchResultsReq",
            &[
                FieldDescriptor::new(1, TypeTag::Struct, "operationHandle"),
                FieldDescriptor::new(2, TypeTag::I32, "orientation"),
                FieldDescriptor::new(3, TypeTag::I64, "maxRows"),
            ],
        );
        assert!(report.is_consistent());
        assert_eq!(report.field_count, 3);
        assert!(report.extension_ids.is_empty());
    }

    #[test]
    fn detects_duplicates_and_extensions() {
        let report = check_descriptors(
            "TExecuteStatementReq",
            &[
                FieldDescriptor::new(2, TypeTag::String, "statement"),
                FieldDescriptor::new(0x502, TypeTag::Bool, "canReadArrowResult"),
                FieldDescriptor::new(2, TypeTag::String, "statementAgain"),
                FieldDescriptor::new(0x501, TypeTag::Struct, "getDirectResults"),
            ],
        );
        assert!(!report.is_consistent());
        assert_eq!(report.duplicate_ids, [2]);
        assert_eq!(report.extension_ids, [0x501, 0x502]);
    }
}
