//! Row filtering
//!
//! A row survives only if it passes every rule. A missing cell (null, absent
//! or the empty string) fails every operator, `not_equals` included, so a
//! rule never matches a value that is not there.

use dash_core::{DataRow, DataValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::DataError;

/// Comparison performed by a [`FilterRule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 8] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::Gt,
        FilterOperator::Lt,
        FilterOperator::Gte,
        FilterOperator::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lte => "lte",
        }
    }

    /// Short label for the filter bar
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "≠",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts with",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Gte => "≥",
            FilterOperator::Lte => "≤",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FilterOperator::Gt | FilterOperator::Lt | FilterOperator::Gte | FilterOperator::Lte
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DataError::UnknownOperator(s.to_string()))
    }
}

/// One column predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: String,
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterRule {
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    /// Whether `row` passes this rule
    pub fn matches(&self, row: &DataRow) -> bool {
        // absent columns read as null
        let cell = row.get(&self.column);
        if cell.is_null() {
            return false;
        }

        if self.operator.is_numeric() {
            return compare_numeric(cell, &self.value, self.operator);
        }

        let cell = cell.to_string().to_lowercase();
        let target = self.value.to_lowercase();
        match self.operator {
            FilterOperator::Equals => cell == target,
            FilterOperator::NotEquals => cell != target,
            FilterOperator::Contains => cell.contains(&target),
            FilterOperator::StartsWith => cell.starts_with(&target),
            _ => false,
        }
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator.symbol(), self.value)
    }
}

fn compare_numeric(cell: &DataValue, value: &str, operator: FilterOperator) -> bool {
    let (Some(lhs), Some(rhs)) = (cell.as_number(), dash_core::value::parse_finite(value)) else {
        return false;
    };
    match operator {
        FilterOperator::Gt => lhs > rhs,
        FilterOperator::Lt => lhs < rhs,
        FilterOperator::Gte => lhs >= rhs,
        FilterOperator::Lte => lhs <= rhs,
        _ => false,
    }
}

/// Rows passing every rule, in their original order
pub fn apply(rows: &[DataRow], rules: &[FilterRule]) -> Vec<DataRow> {
    if rules.is_empty() {
        return rows.to_vec();
    }
    let filtered: Vec<DataRow> = rows
        .iter()
        .filter(|row| rules.iter().all(|rule| rule.matches(row)))
        .cloned()
        .collect();
    debug!(
        "Filtered {} rows to {} with {} rules",
        rows.len(),
        filtered.len(),
        rules.len()
    );
    filtered
}

/// Ordered collection of rules, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    rules: Vec<FilterRule>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule and return its id
    pub fn add(&mut self, rule: FilterRule) -> String {
        let id = rule.id.clone();
        self.rules.retain(|r| r.id != id);
        self.rules.push(rule);
        id
    }

    /// Remove the rule with `id`, returning it if present
    pub fn remove(&mut self, id: &str) -> Option<FilterRule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn apply(&self, rows: &[DataRow]) -> Vec<DataRow> {
        apply(rows, &self.rules)
    }
}
