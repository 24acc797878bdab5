use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::types::SqlValue;

/// A single row from a read statement.
///
/// The column header is shared by every row of a result set, so buffering a
/// large result clones an `Arc` per row rather than the name list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The column names for this row (shared across all rows in a result set)
    pub columns: Arc<Vec<String>>,
    /// The values for this row, in column order
    pub values: Vec<SqlValue>,
}

impl Row {
    #[must_use]
    pub fn new(columns: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Get the index of a column by name
    ///
    /// # Returns
    ///
    /// The index of the column, or None if not found
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Get a value from the row by column name
    ///
    /// # Returns
    ///
    /// The value at the column, or None if the column wasn't found
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.column_index(column)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    ///
    /// # Returns
    ///
    /// The value at the index, or None if the index is out of bounds
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// The shared column header, in column order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Consume the row, keeping only the values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the row as a JSON object, preserving column order.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = JsonMap::with_capacity(self.values.len());
        for (name, value) in self.columns.iter().zip(self.values.iter()) {
            map.insert(name.clone(), JsonValue::from(value.clone()));
        }
        JsonValue::Object(map)
    }
}
