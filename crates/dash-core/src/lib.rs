//! Core types for the insight dashboard
//!
//! This crate holds the data model shared by every other crate: rows and
//! values, chart configurations, analysis reports, palettes, and the view
//! state that drives zoom, pan and series visibility. The comparison
//! coordinator and the dashboard event bus live here too.

pub mod analysis;
pub mod chart;
pub mod comparison;
pub mod events;
pub mod palette;
pub mod report;
pub mod row;
pub mod settings;
pub mod value;
pub mod view_state;
pub mod visibility;

use std::path::PathBuf;
use thiserror::Error;

// Re-export commonly used types
pub use analysis::{
    AnalysisConfig, AnalysisError, AnalysisFeatures, AnalysisResult, AnalysisService,
    DetailLevel, ModelTier, PerformancePulse, ReanalysisSink, StatValue, Statistic,
};
pub use chart::{ChartConfig, ChartType, ConfigIssue};
pub use comparison::{ComparisonCoordinator, ComparisonError, ComparisonState};
pub use events::EventBus;
pub use palette::{Palette, Rgb};
pub use report::Report;
pub use row::{column_union, header_columns, DataRow};
pub use settings::DashboardSettings;
pub use value::DataValue;
pub use view_state::{LocalViewState, SharedViewState, ViewState, ViewStateSource};
pub use visibility::SeriesVisibility;

/// Errors raised by the core crate
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid settings file {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
