//! Result metadata shared by every row of a result.
//!
//! Built once per response and never mutated afterwards; rows and pages hold
//! it through an `Arc`.

use std::collections::HashMap;

use super::column::ColumnDescription;

/// Column descriptions and name index for one logical result.
#[derive(Debug, Clone, Default)]
pub struct RowSetMetadata {
    columns: Vec<ColumnDescription>,
    name_index: HashMap<String, usize>,
    partition_key_indices: Vec<u16>,
}

impl RowSetMetadata {
    /// Create metadata from ordered column descriptions.
    pub fn new(columns: Vec<ColumnDescription>) -> Self {
        Self::with_partition_keys(columns, Vec::new())
    }

    /// Create metadata that also records partition-key column indices.
    pub fn with_partition_keys(
        columns: Vec<ColumnDescription>,
        partition_key_indices: Vec<u16>,
    ) -> Self {
        let mut name_index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            // First occurrence wins for duplicate names (e.g. `SELECT a, a`).
            name_index.entry(col.name.clone()).or_insert(i);
        }
        Self {
            columns,
            name_index,
            partition_key_indices,
        }
    }

    /// Column descriptions in result order.
    pub fn columns(&self) -> &[ColumnDescription] {
        &self.columns
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column by index.
    pub fn get(&self, index: usize) -> Option<&ColumnDescription> {
        self.columns.get(index)
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find column index by name: exact match first, then case-insensitive.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        if let Some(&idx) = self.name_index.get(name) {
            return Some(idx);
        }
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Indices of the partition-key columns (prepared statements only).
    pub fn partition_key_indices(&self) -> &[u16] {
        &self.partition_key_indices
    }
}
