//! Scalar cell values
//!
//! Rows are untyped key/value maps upstream; every cell is one of the four
//! variants of [`DataValue`]. Serialization is untagged so a JSON dataset
//! (`[{"region": "East", "sales": 10}]`) maps onto rows directly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Shared null returned when a row has no value for a column
pub(crate) static NULL: DataValue = DataValue::Null;

impl DataValue {
    /// Null or the empty string
    pub fn is_missing(&self) -> bool {
        match self {
            DataValue::Null => true,
            DataValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// True only for values stored as numbers (no string coercion)
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataValue::Number(n) if n.is_finite())
    }

    /// The stored number, if this value is a finite number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Coerce to a finite number.
    ///
    /// Numbers pass through; strings are trimmed and parsed. Booleans and
    /// nulls never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) if n.is_finite() => Some(*n),
            DataValue::Text(s) => parse_finite(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Type rank used by [`DataValue::total_cmp`]: nulls sort first
    fn rank(&self) -> u8 {
        match self {
            DataValue::Null => 0,
            DataValue::Bool(_) => 1,
            DataValue::Number(_) => 2,
            DataValue::Text(_) => 3,
        }
    }

    /// Total ordering: `Null < Bool < Number < Text`.
    ///
    /// Within a variant, booleans order `false < true`, numbers use
    /// [`f64::total_cmp`] and text is compared lexicographically.
    pub fn total_cmp(&self, other: &DataValue) -> Ordering {
        match (self, other) {
            (DataValue::Bool(a), DataValue::Bool(b)) => a.cmp(b),
            (DataValue::Number(a), DataValue::Number(b)) => a.total_cmp(b),
            (DataValue::Text(a), DataValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Parse a string as a finite f64 after trimming
pub fn parse_finite(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number the way it reads in a table: integral values lose the
/// trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => Ok(()),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Number(n) => f.write_str(&format_number(*n)),
            DataValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for DataValue {
    fn from(n: f64) -> Self {
        DataValue::Number(n)
    }
}

impl From<i64> for DataValue {
    fn from(n: i64) -> Self {
        DataValue::Number(n as f64)
    }
}

impl From<i32> for DataValue {
    fn from(n: i32) -> Self {
        DataValue::Number(n as f64)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Text(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Text(s)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values() {
        assert!(DataValue::Null.is_missing());
        assert!(DataValue::from("").is_missing());
        assert!(!DataValue::from(" ").is_missing());
        assert!(!DataValue::from(0.0).is_missing());
        assert!(!DataValue::from(false).is_missing());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(DataValue::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(DataValue::from(3).as_number(), Some(3.0));
        assert_eq!(DataValue::from("abc").as_number(), None);
        assert_eq!(DataValue::from("inf").as_number(), None);
        assert_eq!(DataValue::from(true).as_number(), None);
        assert_eq!(DataValue::Null.as_number(), None);
        assert_eq!(DataValue::from("7").as_f64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataValue::from(10).to_string(), "10");
        assert_eq!(DataValue::from(2.5).to_string(), "2.5");
        assert_eq!(DataValue::Null.to_string(), "");
        assert_eq!(DataValue::from(true).to_string(), "true");
    }

    #[test]
    fn test_total_ordering_puts_nulls_first() {
        let mut values = vec![
            DataValue::from("b"),
            DataValue::from(2),
            DataValue::Null,
            DataValue::from(true),
            DataValue::from(-1),
            DataValue::from("a"),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                DataValue::Null,
                DataValue::from(true),
                DataValue::from(-1),
                DataValue::from(2),
                DataValue::from("a"),
                DataValue::from("b"),
            ]
        );
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<DataValue> = serde_json::from_str(r#"[null, true, 1.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                DataValue::Null,
                DataValue::Bool(true),
                DataValue::Number(1.5),
                DataValue::Text("x".into())
            ]
        );
    }
}
