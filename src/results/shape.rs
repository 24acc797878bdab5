use serde::{Deserialize, Serialize};

use crate::types::SqlValue;

use super::row::Row;

/// How fetched rows are shaped before they are handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchShape {
    /// Column-name/value pairs, in column order.
    #[default]
    Associative,
    /// Values only, addressed by zero-based column position.
    Indexed,
    /// The full [`Row`], column header included.
    Record,
}

impl FetchShape {
    /// Shape to use when this is the statement-wide default. `Record` decays
    /// to `Associative`; an explicit per-fetch `Record` is honored as-is.
    #[must_use]
    pub fn normalize_default(self) -> Self {
        match self {
            FetchShape::Record => FetchShape::Associative,
            other => other,
        }
    }
}

/// A fetched row after shaping.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedRow {
    Associative(Vec<(String, SqlValue)>),
    Indexed(Vec<SqlValue>),
    Record(Row),
}

impl ShapedRow {
    /// Shape a buffered row for the caller.
    #[must_use]
    pub fn from_row(row: &Row, shape: FetchShape) -> Self {
        match shape {
            FetchShape::Associative => ShapedRow::Associative(
                row.columns
                    .iter()
                    .cloned()
                    .zip(row.values.iter().cloned())
                    .collect(),
            ),
            FetchShape::Indexed => ShapedRow::Indexed(row.values.clone()),
            FetchShape::Record => ShapedRow::Record(row.clone()),
        }
    }

    /// Look a value up by column name. `Indexed` rows have no names and
    /// always return None.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        match self {
            ShapedRow::Associative(pairs) => pairs
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value),
            ShapedRow::Indexed(_) => None,
            ShapedRow::Record(row) => row.get(column),
        }
    }

    /// Look a value up by zero-based column position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        match self {
            ShapedRow::Associative(pairs) => pairs.get(index).map(|(_, value)| value),
            ShapedRow::Indexed(values) => values.get(index),
            ShapedRow::Record(row) => row.get_by_index(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn sample_row() -> Row {
        Row::new(
            Arc::new(vec!["id".to_string(), "name".to_string()]),
            vec![SqlValue::Int(1), SqlValue::Text("alice".into())],
        )
    }

    #[test]
    fn record_decays_to_associative_as_default() {
        assert_eq!(
            FetchShape::Record.normalize_default(),
            FetchShape::Associative
        );
        assert_eq!(
            FetchShape::Indexed.normalize_default(),
            FetchShape::Indexed
        );
    }

    #[test]
    fn shapes_preserve_column_order() {
        let row = sample_row();
        let assoc = ShapedRow::from_row(&row, FetchShape::Associative);
        assert_eq!(assoc.get("name"), Some(&SqlValue::Text("alice".into())));
        assert_eq!(assoc.get_by_index(0), Some(&SqlValue::Int(1)));

        let indexed = ShapedRow::from_row(&row, FetchShape::Indexed);
        assert_eq!(indexed.get("name"), None);
        assert_eq!(indexed.get_by_index(1), Some(&SqlValue::Text("alice".into())));

        let record = ShapedRow::from_row(&row, FetchShape::Record);
        assert_eq!(record.get("id"), Some(&SqlValue::Int(1)));
    }
}
