//! Declarative chart configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::row::{column_union, DataRow};

/// Chart kinds the dashboard can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
    Radar,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Pie,
        ChartType::Scatter,
        ChartType::Radar,
    ];

    /// Whether zoom/pan windowing applies.
    ///
    /// Scatter points carry meaning by identity rather than sequence, and a
    /// pie is a whole-dataset breakdown, so neither is windowed.
    pub fn is_windowed(&self) -> bool {
        !matches!(self, ChartType::Scatter | ChartType::Pie)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Radar => "radar",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chart suggested by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: ChartType,

    pub title: String,

    /// Column plotted along the x axis (or slice label / radar axis)
    pub x_axis: String,

    /// Primary value column
    pub y_axis: String,

    /// Optional column used to split values into series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Extra value columns plotted as additional series
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_keys: Vec<String>,

    #[serde(default)]
    pub data: Vec<DataRow>,
}

/// A column reference that does not exist in the chart's rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub role: &'static str,
    pub column: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} column '{}' not present in data", self.role, self.column)
    }
}

impl ChartConfig {
    pub fn new(
        chart_type: ChartType,
        title: impl Into<String>,
        x_axis: impl Into<String>,
        y_axis: impl Into<String>,
    ) -> Self {
        Self {
            chart_type,
            title: title.into(),
            x_axis: x_axis.into(),
            y_axis: y_axis.into(),
            category: None,
            additional_keys: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_additional_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, data: Vec<DataRow>) -> Self {
        self.data = data;
        self
    }

    /// `yAxis` followed by `additionalKeys`, duplicates and blanks removed
    pub fn series_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(&self.y_axis)
            .chain(self.additional_keys.iter())
            .filter(|k| !k.is_empty() && seen.insert(k.as_str()))
            .cloned()
            .collect()
    }

    /// Check column references against the columns observed in `rows`.
    ///
    /// An empty row set has no observable columns, so nothing is reported.
    pub fn validate(&self, rows: &[DataRow]) -> Vec<ConfigIssue> {
        if rows.is_empty() {
            return Vec::new();
        }
        let columns: HashSet<String> = column_union(rows).into_iter().collect();
        let mut issues = Vec::new();

        let mut check = |role: &'static str, column: &str| {
            if !column.is_empty() && !columns.contains(column) {
                issues.push(ConfigIssue {
                    role,
                    column: column.to_string(),
                });
            }
        };

        check("x axis", &self.x_axis);
        check("y axis", &self.y_axis);
        if let Some(category) = &self.category {
            check("category", category);
        }
        for key in &self.additional_keys {
            check("series", key);
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "type": "line",
            "title": "Sales",
            "xAxis": "month",
            "yAxis": "sales",
            "additionalKeys": ["cost", "sales"],
            "data": [{"month": "Jan", "sales": 1, "cost": 2}]
        }"#;
        let config: ChartConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.chart_type, ChartType::Line);
        assert_eq!(config.series_keys(), vec!["sales", "cost"]);
        assert_eq!(config.data.len(), 1);
        assert!(config.category.is_none());
    }

    #[test]
    fn test_windowed_types() {
        assert!(ChartType::Bar.is_windowed());
        assert!(ChartType::Radar.is_windowed());
        assert!(!ChartType::Scatter.is_windowed());
        assert!(!ChartType::Pie.is_windowed());
    }

    #[test]
    fn test_validate_reports_unknown_columns() {
        let config = ChartConfig::new(ChartType::Bar, "t", "region", "revenue")
            .with_additional_keys(["sales"])
            .with_category("segment");
        let rows = vec![row! { "region" => "East", "sales" => 10 }];
        let issues = config.validate(&rows);
        let missing: Vec<_> = issues.iter().map(|i| i.column.as_str()).collect();
        assert_eq!(missing, vec!["revenue", "segment"]);
        assert!(config.validate(&[]).is_empty());
    }
}
