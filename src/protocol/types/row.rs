//! Row type for query results.

use std::sync::Arc;

use crate::error::{Error, Result};

use super::column::ColumnDescription;
use super::convert::{short_type_name, FromCqlValue};
use super::metadata::RowSetMetadata;
use super::value::CqlValue;

/// A row of query results.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values, one per column.
    values: Vec<CqlValue>,
    /// Shared result metadata (reference counted).
    metadata: Arc<RowSetMetadata>,
}

impl Row {
    /// Create a new row with values and shared metadata.
    ///
    /// Fails if the number of values differs from the number of columns.
    pub fn new(values: Vec<CqlValue>, metadata: Arc<RowSetMetadata>) -> Result<Self> {
        if values.len() != metadata.len() {
            return Err(Error::protocol(format!(
                "Row has {} values but result has {} columns",
                values.len(),
                metadata.len()
            )));
        }
        Ok(Self { values, metadata })
    }

    /// Get the raw value by column index (0-based).
    pub fn value(&self, index: usize) -> Option<&CqlValue> {
        self.values.get(index)
    }

    /// Get a value by column index, converted to `T`.
    ///
    /// NULL converts only into types that can hold it, such as `Option<T>`.
    pub fn get<T: FromCqlValue>(&self, index: usize) -> Result<T> {
        let value = self.checked_value(index)?;
        if value.is_null() {
            return T::from_null().ok_or_else(|| Error::NullValue {
                column: self.metadata.columns()[index].name.clone(),
                requested: short_type_name::<T>(),
            });
        }
        T::from_cql(value)
    }

    /// Get a value by column name, converted to `T`.
    pub fn get_by_name<T: FromCqlValue>(&self, name: &str) -> Result<T> {
        self.get(self.index_of(name)?)
    }

    /// Check whether the value at `index` is NULL.
    pub fn is_null(&self, index: usize) -> Result<bool> {
        Ok(self.checked_value(index)?.is_null())
    }

    /// Check whether the named column is NULL.
    pub fn is_null_by_name(&self, name: &str) -> Result<bool> {
        self.is_null(self.index_of(name)?)
    }

    /// Get a column description by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.metadata
            .find_by_name(name)
            .and_then(|idx| self.metadata.get(idx))
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get all values.
    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }

    /// Get column descriptions.
    pub fn columns(&self) -> &[ColumnDescription] {
        self.metadata.columns()
    }

    /// Get the shared metadata.
    pub fn metadata(&self) -> &Arc<RowSetMetadata> {
        &self.metadata
    }

    /// Iterate over values in column order.
    pub fn iter(&self) -> impl Iterator<Item = &CqlValue> {
        self.values.iter()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.metadata
            .find_by_name(name)
            .ok_or_else(|| Error::ColumnNotFound {
                name: name.to_string(),
            })
    }

    fn checked_value(&self, index: usize) -> Result<&CqlValue> {
        self.values
            .get(index)
            .ok_or(Error::ColumnIndexOutOfBounds {
                index,
                count: self.values.len(),
            })
    }
}

impl IntoIterator for Row {
    type Item = CqlValue;
    type IntoIter = std::vec::IntoIter<CqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a CqlValue;
    type IntoIter = std::slice::Iter<'a, CqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
