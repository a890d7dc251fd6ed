//! Analysis report schema and the service boundary
//!
//! The report generator is an external collaborator. The dashboard only
//! consumes [`AnalysisResult`] and, after cleaning, hands a new dataset back
//! through [`ReanalysisSink`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chart::ChartConfig;
use crate::row::DataRow;
use crate::value::format_number;

/// Structured report returned by the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,

    #[serde(default)]
    pub insights: Vec<String>,

    #[serde(default)]
    pub statistics: Vec<Statistic>,

    #[serde(default)]
    pub performance_pulse: PerformancePulse,

    #[serde(default)]
    pub suggested_charts: Vec<ChartConfig>,
}

/// A headline number shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub label: String,
    pub value: StatValue,
}

impl Statistic {
    pub fn new(label: impl Into<String>, value: impl Into<StatValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(n) => f.write_str(&format_number(*n)),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for StatValue {
    fn from(n: f64) -> Self {
        StatValue::Number(n)
    }
}

impl From<usize> for StatValue {
    fn from(n: usize) -> Self {
        StatValue::Number(n as f64)
    }
}

impl From<&str> for StatValue {
    fn from(s: &str) -> Self {
        StatValue::Text(s.to_string())
    }
}

impl From<String> for StatValue {
    fn from(s: String) -> Self {
        StatValue::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformancePulse {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// Which model tier the service should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Pro,
    Flash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Brief,
    #[default]
    Standard,
    Deep,
}

/// Optional analyses requested from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFeatures {
    pub trend_prediction: bool,
    pub anomaly_detection: bool,
    pub correlation_analysis: bool,
    pub strategic_forecasting: bool,
}

impl Default for AnalysisFeatures {
    fn default() -> Self {
        Self {
            trend_prediction: true,
            anomaly_detection: false,
            correlation_analysis: true,
            strategic_forecasting: false,
        }
    }
}

/// Request options passed along with a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default)]
    pub model: ModelTier,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default)]
    pub features: AnalysisFeatures,
}

/// Failures reported by an analysis service
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("malformed analysis response: {0}")]
    Malformed(String),
}

/// The external report generator
#[async_trait::async_trait]
pub trait AnalysisService: Send + Sync {
    /// Produce a report for `rows` loaded from `file_name`
    async fn analyze(
        &self,
        rows: Vec<DataRow>,
        file_name: &str,
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Receiver for cleaned datasets.
///
/// Implementations must return immediately; the analysis result is reported
/// through the collaborator's own channel, never through this call.
pub trait ReanalysisSink: Send + Sync {
    fn request_reanalysis(&self, rows: Vec<DataRow>, file_name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_parses_with_defaults() {
        let json = r#"{
            "summary": "Quarterly sales",
            "insights": ["East leads"],
            "statistics": [{"label": "Rows", "value": 3}, {"label": "Top", "value": "East"}],
            "suggestedCharts": []
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.statistics[0].value.to_string(), "3");
        assert_eq!(result.statistics[1].value.to_string(), "East");
        assert!(result.performance_pulse.strengths.is_empty());
    }

    #[test]
    fn test_config_round_trip() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"detailLevel\":\"standard\""));
        assert!(json.contains("\"trendPrediction\":true"));
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
