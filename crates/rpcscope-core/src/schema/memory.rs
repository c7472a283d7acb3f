use std::collections::HashMap;

use super::{FieldDescriptor, SchemaRegistry, report::SchemaReport};

/// In-memory schema registry
///
/// Built up front (usually from generated interface definitions, by whoever
/// provisions the decoder) and read-only afterwards. `Clone` copies the whole
/// table; wrap it in an `Arc` to share it instead.
///
/// # Performance
///
/// - lookup_field_descriptors: O(1)
/// - with_struct / insert: O(1) amortized
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    structs: HashMap<String, Vec<FieldDescriptor>>,
}

impl StaticRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a struct schema (builder form)
    #[must_use]
    pub fn with_struct(
        mut self,
        struct_name: impl Into<String>,
        descriptors: Vec<FieldDescriptor>,
    ) -> Self {
        self.insert(struct_name, descriptors);
        self
    }

    /// Add or replace a struct schema
    pub fn insert(&mut self, struct_name: impl Into<String>, descriptors: Vec<FieldDescriptor>) {
        self.structs.insert(struct_name.into(), descriptors);
    }

    /// Number of struct schemas
    #[must_use]
    pub fn struct_count(&self) -> usize {
        self.structs.len()
    }

    /// Consistency report for every struct, sorted by struct name
    #[must_use]
    pub fn reports(&self) -> Vec<SchemaReport> {
        let mut reports: Vec<_> = self
            .structs
            .iter()
            .map(|(name, descriptors)| super::check_descriptors(name, descriptors))
            .collect();
        reports.sort_by(|a, b| a.struct_name.cmp(&b.struct_name));
        reports
    }
}

impl SchemaRegistry for StaticRegistry {
    fn lookup_field_descriptors(&self, struct_name: &str) -> Option<&[FieldDescriptor]> {
        self.structs.get(struct_name).map(Vec::as_slice)
    }
}
