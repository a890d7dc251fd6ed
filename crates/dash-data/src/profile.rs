//! Per-column statistics

use ahash::AHashSet;
use dash_core::{column_union, DataRow, DataValue};

/// Dominant type of a column's present values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Boolean,
    Mixed,
    /// No present values at all
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub sum: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    /// Present (non-missing) values
    pub count: usize,
    pub missing: usize,
    pub distinct: usize,
    pub numeric: Option<NumericSummary>,
}

impl ColumnProfile {
    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn is_complete(&self) -> bool {
        self.missing == 0
    }
}

/// Profile every column of `rows`, in first-seen column order
pub fn profile_columns(rows: &[DataRow]) -> Vec<ColumnProfile> {
    column_union(rows)
        .into_iter()
        .map(|name| profile_column(rows, name))
        .collect()
}

fn profile_column(rows: &[DataRow], name: String) -> ColumnProfile {
    let mut numbers = Vec::new();
    let mut texts = 0usize;
    let mut bools = 0usize;
    let mut missing = 0usize;
    let mut distinct = AHashSet::new();

    for row in rows {
        let value = row.get(&name);
        if value.is_missing() {
            missing += 1;
            continue;
        }
        distinct.insert(value.to_string());
        match value {
            DataValue::Number(n) if n.is_finite() => numbers.push(*n),
            DataValue::Bool(_) => bools += 1,
            _ => texts += 1,
        }
    }

    let count = rows.len() - missing;
    let kind = match (numbers.len(), texts, bools) {
        (0, 0, 0) => ColumnKind::Empty,
        (n, 0, 0) if n > 0 => ColumnKind::Numeric,
        (0, t, 0) if t > 0 => ColumnKind::Text,
        (0, 0, b) if b > 0 => ColumnKind::Boolean,
        _ => ColumnKind::Mixed,
    };

    ColumnProfile {
        name,
        kind,
        count,
        missing,
        distinct: distinct.len(),
        numeric: summarize(&numbers),
    }
}

fn summarize(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(NumericSummary {
        min,
        max,
        mean,
        sum,
        std_dev: variance.sqrt(),
    })
}
