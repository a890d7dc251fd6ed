//! Offline analysis service
//!
//! [`LocalAnalysisService`] builds a report from column profiles alone. It
//! lets the dashboard run without a remote report generator and gives tests
//! a deterministic [`AnalysisService`].

use async_trait::async_trait;
use dash_core::value::format_number;
use dash_core::{
    AnalysisConfig, AnalysisError, AnalysisResult, AnalysisService, ChartConfig, ChartType,
    DataRow, DetailLevel, PerformancePulse, Statistic,
};
use tracing::info;

use crate::cleaning::CleaningDiagnostics;
use crate::profile::{profile_columns, ColumnKind, ColumnProfile};

/// Most distinct labels a pie chart is suggested for
const MAX_PIE_SLICES: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct LocalAnalysisService;

impl LocalAnalysisService {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous form of [`AnalysisService::analyze`]
    pub fn analyze_rows(
        &self,
        rows: &[DataRow],
        file_name: &str,
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        if rows.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let profiles = profile_columns(rows);
        let numeric: Vec<&ColumnProfile> = profiles.iter().filter(|p| p.is_numeric()).collect();
        let label = profiles
            .iter()
            .find(|p| p.kind == ColumnKind::Text)
            .or_else(|| profiles.first());

        let summary = format!(
            "{} contains {} rows across {} columns, {} of them numeric.",
            file_name,
            rows.len(),
            profiles.len(),
            numeric.len()
        );

        let mut statistics = vec![
            Statistic::new("Rows", rows.len()),
            Statistic::new("Columns", profiles.len()),
        ];
        for profile in numeric.iter().take(4) {
            if let Some(summary) = &profile.numeric {
                statistics.push(Statistic::new(
                    format!("Avg {}", profile.name),
                    round2(summary.mean),
                ));
            }
        }

        let mut insights = range_insights(&numeric);
        if config.features.trend_prediction {
            insights.extend(numeric.first().and_then(|p| trend_insight(rows, &p.name)));
        }
        if config.features.anomaly_detection {
            insights.extend(numeric.iter().filter_map(|p| anomaly_insight(rows, p)));
        }
        if config.features.correlation_analysis {
            if let [a, b, ..] = numeric.as_slice() {
                insights.extend(correlation_insight(rows, &a.name, &b.name));
            }
        }
        if config.features.strategic_forecasting {
            insights.extend(numeric.first().and_then(|p| forecast_insight(rows, &p.name)));
        }
        let limit = match config.detail_level {
            DetailLevel::Brief => 3,
            DetailLevel::Standard => 6,
            DetailLevel::Deep => usize::MAX,
        };
        insights.truncate(limit);

        let suggested_charts = match label {
            Some(label) => suggest_charts(label, &numeric, config),
            None => Vec::new(),
        };

        info!(
            "Local analysis of '{}': {} insights, {} charts",
            file_name,
            insights.len(),
            suggested_charts.len()
        );
        Ok(AnalysisResult {
            summary,
            insights,
            statistics,
            performance_pulse: pulse(rows, &profiles),
            suggested_charts,
        })
    }
}

#[async_trait]
impl AnalysisService for LocalAnalysisService {
    async fn analyze(
        &self,
        rows: Vec<DataRow>,
        file_name: &str,
        config: &AnalysisConfig,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_rows(&rows, file_name, config)
    }
}

fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

fn column_values(rows: &[DataRow], column: &str) -> Vec<f64> {
    rows.iter().filter_map(|r| r.get(column).as_f64()).collect()
}

fn range_insights(numeric: &[&ColumnProfile]) -> Vec<String> {
    numeric
        .iter()
        .filter_map(|p| {
            let s = p.numeric.as_ref()?;
            Some(format!(
                "{} ranges from {} to {} with a mean of {}.",
                p.name,
                format_number(round2(s.min)),
                format_number(round2(s.max)),
                format_number(round2(s.mean))
            ))
        })
        .collect()
}

/// Compare the mean of the first and second half of a column
fn trend_insight(rows: &[DataRow], column: &str) -> Option<String> {
    let values = column_values(rows, column);
    if values.len() < 4 {
        return None;
    }
    let (first, second) = values.split_at(values.len() / 2);
    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    let (before, after) = (mean(first), mean(second));
    if before == 0.0 {
        return None;
    }
    let change = (after - before) / before.abs() * 100.0;
    let direction = if change >= 0.0 { "upward" } else { "downward" };
    Some(format!(
        "{} trends {} ({:+.1}%) from the first to the second half of the data.",
        column, direction, change
    ))
}

/// Values more than two standard deviations from the mean
fn anomaly_insight(rows: &[DataRow], profile: &ColumnProfile) -> Option<String> {
    let summary = profile.numeric.as_ref()?;
    if summary.std_dev == 0.0 {
        return None;
    }
    let outliers = column_values(rows, &profile.name)
        .into_iter()
        .filter(|v| (v - summary.mean).abs() > 2.0 * summary.std_dev)
        .count();
    (outliers > 0).then(|| {
        format!(
            "{} has {} value(s) more than two standard deviations from its mean.",
            profile.name, outliers
        )
    })
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 3 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

fn correlation_insight(rows: &[DataRow], a: &str, b: &str) -> Option<String> {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.get(a).as_f64()?, r.get(b).as_f64()?)))
        .collect();
    let r = pearson(&pairs)?;
    let strength = match r.abs() {
        x if x >= 0.7 => "strong",
        x if x >= 0.4 => "moderate",
        _ => "weak",
    };
    let sign = if r >= 0.0 { "positive" } else { "negative" };
    Some(format!(
        "{} and {} show a {} {} correlation (r = {:.2}).",
        a, b, strength, sign, r
    ))
}

/// Least-squares projection of the next value in row order
fn forecast_insight(rows: &[DataRow], column: &str) -> Option<String> {
    let values = column_values(rows, column);
    if values.len() < 3 {
        return None;
    }
    let pairs: Vec<(f64, f64)> = values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect();
    let n = pairs.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let sxx: f64 = pairs.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = pairs.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let slope = sxy / sxx;
    let next = mean_y + slope * (n - mean_x);
    Some(format!(
        "At the current pace the next {} value is projected near {}.",
        column,
        format_number(round2(next))
    ))
}

fn pulse(rows: &[DataRow], profiles: &[ColumnProfile]) -> PerformancePulse {
    let mut strengths = Vec::new();
    let mut risks = Vec::new();

    let complete: Vec<&str> = profiles
        .iter()
        .filter(|p| p.is_complete())
        .map(|p| p.name.as_str())
        .collect();
    if complete.len() == profiles.len() {
        strengths.push("Every column is fully populated.".to_string());
    } else if !complete.is_empty() {
        strengths.push(format!("Complete columns: {}.", complete.join(", ")));
    }
    if profiles.iter().filter(|p| p.is_numeric()).count() >= 2 {
        strengths.push("Multiple numeric measures support comparison charts.".to_string());
    }

    for profile in profiles.iter().filter(|p| !p.is_complete()) {
        risks.push(format!(
            "{} is missing {} of {} values.",
            profile.name,
            profile.missing,
            rows.len()
        ));
    }
    let duplicates = CleaningDiagnostics::inspect(rows).duplicate_rows;
    if duplicates > 0 {
        risks.push(format!("{} duplicate row(s) detected.", duplicates));
    }

    PerformancePulse { strengths, risks }
}

fn suggest_charts(
    label: &ColumnProfile,
    numeric: &[&ColumnProfile],
    config: &AnalysisConfig,
) -> Vec<ChartConfig> {
    let measures: Vec<&str> = numeric
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| *name != label.name)
        .collect();
    let Some(&primary) = measures.first() else {
        return Vec::new();
    };

    let mut charts = vec![ChartConfig::new(
        ChartType::Bar,
        format!("{} by {}", primary, label.name),
        label.name.as_str(),
        primary,
    )];

    if measures.len() >= 2 {
        charts.push(
            ChartConfig::new(
                ChartType::Line,
                format!("{} over {}", measures.join(", "), label.name),
                label.name.as_str(),
                primary,
            )
            .with_additional_keys(measures[1..].iter().copied()),
        );
        if config.features.correlation_analysis {
            charts.push(ChartConfig::new(
                ChartType::Scatter,
                format!("{} vs {}", measures[1], primary),
                primary,
                measures[1],
            ));
        }
    } else {
        charts.push(ChartConfig::new(
            ChartType::Area,
            format!("{} trend", primary),
            label.name.as_str(),
            primary,
        ));
    }

    if label.kind == ColumnKind::Text
        && label.distinct <= MAX_PIE_SLICES
        && config.detail_level != DetailLevel::Brief
    {
        charts.push(ChartConfig::new(
            ChartType::Pie,
            format!("{} share by {}", primary, label.name),
            label.name.as_str(),
            primary,
        ));
    }
    charts
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{row, DataValue};

    fn sales() -> Vec<DataRow> {
        vec![
            row! { "month" => "Jan", "sales" => 10, "cost" => 4 },
            row! { "month" => "Feb", "sales" => 20, "cost" => 9 },
            row! { "month" => "Mar", "sales" => 30, "cost" => 13 },
            row! { "month" => "Apr", "sales" => 40, "cost" => DataValue::Null },
        ]
    }

    #[test]
    fn test_report_shape() {
        let service = LocalAnalysisService::new();
        let result = service
            .analyze_rows(&sales(), "sales.csv", &AnalysisConfig::default())
            .unwrap();

        assert!(result.summary.contains("4 rows"));
        assert_eq!(result.statistics[0].value.to_string(), "4");
        assert_eq!(result.statistics[1].value.to_string(), "3");
        assert_eq!(result.statistics[2].label, "Avg sales");
        assert_eq!(result.statistics[2].value.to_string(), "25");
        assert!(result.insights.iter().any(|i| i.contains("trends upward")));
        assert!(result.performance_pulse.risks[0].contains("cost is missing 1"));

        let types: Vec<_> = result.suggested_charts.iter().map(|c| c.chart_type).collect();
        assert_eq!(
            types,
            vec![ChartType::Bar, ChartType::Line, ChartType::Scatter, ChartType::Pie]
        );
        assert_eq!(result.suggested_charts[1].series_keys(), vec!["sales", "cost"]);
    }

    #[test]
    fn test_brief_limits_insights() {
        let config = AnalysisConfig {
            detail_level: DetailLevel::Brief,
            ..AnalysisConfig::default()
        };
        let result = LocalAnalysisService::new()
            .analyze_rows(&sales(), "sales.csv", &config)
            .unwrap();
        assert!(result.insights.len() <= 3);
        assert!(result
            .suggested_charts
            .iter()
            .all(|c| c.chart_type != ChartType::Pie));
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let err = LocalAnalysisService::new()
            .analyze_rows(&[], "empty.csv", &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset));
    }

    #[tokio::test]
    async fn test_async_service() {
        let service: &dyn AnalysisService = &LocalAnalysisService::new();
        let result = service
            .analyze(sales(), "sales.csv", &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(result.suggested_charts[0].x_axis, "month");
    }
}
