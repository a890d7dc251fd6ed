//! Chart views, the dashboard model and exporters
//!
//! [`chart`] turns filtered rows into render frames, [`dashboard`] holds one
//! open report with its filters, charts and comparison session, and
//! [`export`] / [`report`] produce downloadable artifacts. The `*_ui`
//! modules draw the same frames with egui.

pub mod chart;
pub mod chart_ui;
pub mod dashboard;
pub mod export;
pub mod report;
pub mod table_ui;

pub use chart::{
    build_frame, CaptureGuard, ChartFrame, ChartView, EmptyReason, FrameBody, LegendEntry,
};
pub use chart_ui::{chart_card, ChartAction, CompareChrome};
pub use dashboard::Dashboard;
pub use export::{ExportArtifact, ExportError, ExportFormat, ExportOptions};
pub use report::slug::slugify;
pub use report::ReportExporter;
pub use table_ui::{data_table, TableAction};
