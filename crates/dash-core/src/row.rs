//! Dataset rows
//!
//! A [`DataRow`] is an insertion-ordered mapping from column name to
//! [`DataValue`]. Rows in one dataset usually share a column set, but that is
//! not enforced: reading an absent column yields [`DataValue::Null`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::{DataValue, NULL};

/// One record of a dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRow(IndexMap<String, DataValue>);

impl DataRow {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Build a row from `(column, value)` pairs, keeping their order
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<DataValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Value for `column`, or null when the row has no such key
    pub fn get(&self, column: &str) -> &DataValue {
        self.0.get(column).unwrap_or(&NULL)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Insert or replace a value. A new column is appended at the end.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<DataValue>) {
        self.0.insert(column.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &DataValue> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut DataValue)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialized form used for structural equality (de-duplication).
    ///
    /// Two rows share a signature only when every key, value and the key
    /// order are identical.
    pub fn signature(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<DataValue>> FromIterator<(K, V)> for DataRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Union of the column names of `rows`, in first-seen order
pub fn column_union(rows: &[DataRow]) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for row in rows {
        for column in row.columns() {
            if !seen.contains(column) {
                seen.insert(column.to_string());
            }
        }
    }
    seen.into_iter().collect()
}

/// Column names of the first row, the header used by tabular exports
pub fn header_columns(rows: &[DataRow]) -> Vec<String> {
    rows.first()
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Shorthand for building a row in tests and demos:
/// `row! { "region" => "East", "sales" => 10 }`
#[macro_export]
macro_rules! row {
    () => { $crate::DataRow::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::DataRow::new();
        $( row.insert($key, $value); )+
        row
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_absent_column_reads_as_null() {
        let r = row! { "a" => 1 };
        assert_eq!(r.get("a"), &DataValue::from(1));
        assert!(r.get("missing").is_null());
    }

    #[test]
    fn test_signature_is_order_sensitive() {
        let a = row! { "a" => 1, "b" => "x" };
        let b = row! { "a" => 1, "b" => "x" };
        let c = row! { "b" => "x", "a" => 1 };
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), c.signature());
    }

    #[test]
    fn test_column_union_keeps_first_seen_order() {
        let rows = vec![row! { "x" => 1, "y" => 2 }, row! { "z" => 3, "x" => 4 }];
        assert_eq!(column_union(&rows), vec!["x", "y", "z"]);
        assert_eq!(header_columns(&rows), vec!["x", "y"]);
    }

    #[test]
    fn test_json_round_trip_preserves_order() {
        let json = r#"{"zeta":1,"alpha":"a","mid":null}"#;
        let r: DataRow = serde_json::from_str(json).unwrap();
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(serde_json::to_string(&r).unwrap(), json);
    }
}
