//! Headless dashboard state
//!
//! [`Dashboard`] owns everything one open report needs: the source rows,
//! the filter rules and the rows they derive, one [`ChartView`] per
//! suggested chart, the comparison coordinator and the data table query.
//! The egui layer only reads from it and calls its operations, so every
//! behaviour here is testable without a window.

use dash_core::events::events::{DatasetCleaned, ExportFailed, FiltersChanged};
use dash_core::{
    ComparisonCoordinator, ComparisonError, DashboardSettings, DataRow, EventBus, Palette,
    ReanalysisSink, Report,
};
use dash_data::cleaning::{self, CleaningDiagnostics, CleaningOptions, CleaningOutcome};
use dash_data::table::{self, SortState, TablePage, TableQuery};
use dash_data::{FilterRule, FilterSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::chart::{ChartFrame, ChartView};
use crate::export::{ExportArtifact, ExportError, ExportFormat, ExportOptions};
use crate::report::ReportExporter;

/// One open report and all of its derived view state
pub struct Dashboard {
    report: Report,
    rows: Arc<[DataRow]>,
    filters: FilterSet,
    filtered: Arc<[DataRow]>,
    /// Filtered rows per chart: the chart's own data when it has any,
    /// otherwise the report dataset
    chart_rows: Vec<Arc<[DataRow]>>,
    charts: Vec<ChartView>,
    comparison: ComparisonCoordinator,
    palette: Palette,
    table: TableQuery,
    events: Arc<EventBus>,
    settings: DashboardSettings,
}

impl Dashboard {
    pub fn new(report: Report, settings: DashboardSettings) -> Self {
        Self::with_events(report, settings, Arc::new(EventBus::new()))
    }

    pub fn with_events(report: Report, settings: DashboardSettings, events: Arc<EventBus>) -> Self {
        let rows: Arc<[DataRow]> = report.data.clone().into();
        let charts: Vec<ChartView> = report
            .analysis
            .suggested_charts
            .iter()
            .map(|config| {
                let source = if config.data.is_empty() { &rows[..] } else { &config.data[..] };
                ChartView::new(config.clone(), source).with_display_limit(settings.display_limit)
            })
            .collect();

        info!(
            "Opened report '{}': {} rows, {} charts",
            report.name,
            rows.len(),
            charts.len()
        );

        let mut dashboard = Self {
            palette: settings.palette(),
            table: TableQuery {
                page_size: settings.table_page_size,
                ..TableQuery::default()
            },
            comparison: ComparisonCoordinator::new().with_events(events.clone()),
            filtered: rows.clone(),
            chart_rows: Vec::new(),
            rows,
            filters: FilterSet::new(),
            charts,
            report,
            events,
            settings,
        };
        dashboard.chart_rows = dashboard.derive_chart_rows();
        dashboard
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// The unfiltered dataset
    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn filtered_rows(&self) -> &[DataRow] {
        &self.filtered
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        debug!("Palette set to '{}'", palette.name);
        self.palette = palette;
    }

    // ----- Filters -----

    pub fn filters(&self) -> &[FilterRule] {
        self.filters.rules()
    }

    /// Add a rule and re-derive; returns the rule id
    pub fn add_filter(&mut self, rule: FilterRule) -> String {
        let id = self.filters.add(rule);
        self.refilter();
        id
    }

    pub fn remove_filter(&mut self, id: &str) -> bool {
        let removed = self.filters.remove(id).is_some();
        if removed {
            self.refilter();
        }
        removed
    }

    pub fn clear_filters(&mut self) {
        if self.filters.is_empty() {
            return;
        }
        self.filters.clear();
        self.refilter();
    }

    fn derive_chart_rows(&self) -> Vec<Arc<[DataRow]>> {
        self.charts
            .iter()
            .map(|chart| {
                let data = &chart.config().data;
                if data.is_empty() {
                    self.filtered.clone()
                } else {
                    self.filters.apply(data).into()
                }
            })
            .collect()
    }

    /// Recompute every derived row set from the current rules
    fn refilter(&mut self) {
        self.filtered = self.filters.apply(&self.rows).into();
        self.chart_rows = self.derive_chart_rows();

        debug!(
            "{} filter rules match {} of {} rows",
            self.filters.len(),
            self.filtered.len(),
            self.rows.len()
        );
        self.events.publish(FiltersChanged {
            rule_count: self.filters.len(),
            matched_rows: self.filtered.len(),
        });
    }

    // ----- Charts -----

    pub fn charts(&self) -> &[ChartView] {
        &self.charts
    }

    pub fn chart(&self, index: usize) -> Option<&ChartView> {
        self.charts.get(index)
    }

    /// Filtered rows feeding chart `index`
    pub fn chart_rows(&self, index: usize) -> &[DataRow] {
        self.chart_rows.get(index).map(|rows| &rows[..]).unwrap_or(&[])
    }

    pub fn chart_frame(&self, index: usize) -> Option<ChartFrame> {
        let chart = self.charts.get(index)?;
        Some(chart.frame(self.chart_rows(index), &self.palette))
    }

    pub fn frames(&self) -> Vec<ChartFrame> {
        (0..self.charts.len())
            .filter_map(|i| self.chart_frame(i))
            .collect()
    }

    // ----- Comparison -----

    pub fn comparison(&self) -> &ComparisonCoordinator {
        &self.comparison
    }

    pub fn begin_comparison(&mut self) -> Result<(), ComparisonError> {
        self.comparison.begin_selection()
    }

    pub fn toggle_compared(&mut self, index: usize) -> Result<(), ComparisonError> {
        self.comparison.toggle_chart(index)
    }

    pub fn cancel_comparison(&mut self) -> Result<(), ComparisonError> {
        self.comparison.cancel()
    }

    /// Sync the selected charts onto one fresh shared state
    pub fn synthesize_comparison(&mut self) -> Result<(), ComparisonError> {
        self.comparison.synthesize()?;
        self.rebind_sources();
        Ok(())
    }

    pub fn reset_comparison(&mut self) -> Result<(), ComparisonError> {
        self.comparison.reset()
    }

    /// Close the synced view; participants go back to their own state
    pub fn close_comparison(&mut self) -> Result<(), ComparisonError> {
        self.comparison.close()?;
        self.rebind_sources();
        Ok(())
    }

    fn rebind_sources(&mut self) {
        for (index, chart) in self.charts.iter_mut().enumerate() {
            let source = self.comparison.source_for(index, chart.local());
            chart.attach(source);
        }
    }

    // ----- Data table -----

    pub fn table_query(&self) -> &TableQuery {
        &self.table
    }

    /// The table works on the full dataset with its own search and sort;
    /// chart filters do not apply
    pub fn table_page(&self) -> TablePage {
        table::query(&self.rows, &self.table)
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.table.search = search.into();
        self.table.page = 0;
    }

    /// Header click: ascending first, then toggle
    pub fn sort_by(&mut self, column: &str) {
        self.table.sort = Some(SortState::click(self.table.sort.as_ref(), column));
        self.table.page = 0;
    }

    pub fn set_page(&mut self, page: usize) {
        self.table.page = page;
    }

    // ----- Cleaning -----

    /// Quality summary of the source rows
    pub fn diagnostics(&self) -> CleaningDiagnostics {
        CleaningDiagnostics::inspect(&self.rows)
    }

    /// Clean the source rows and hand them to `sink`.
    ///
    /// The open report is left as is; the re-analysed dataset arrives later
    /// as a new report.
    pub fn clean(&self, options: &CleaningOptions, sink: &dyn ReanalysisSink) -> CleaningOutcome {
        let outcome = cleaning::run(&self.rows, options, &self.report.name, sink);
        self.events.publish(DatasetCleaned {
            rows_before: outcome.rows_before,
            rows_after: outcome.rows_after,
        });
        outcome
    }

    // ----- Export -----

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            width: self.settings.export_width,
            height: self.settings.export_height,
            ..ExportOptions::default()
        }
    }

    fn exporter(&self) -> ReportExporter<'_> {
        ReportExporter::new(&self.report).with_options(self.export_options())
    }

    fn report_failure<T>(
        &self,
        target: &str,
        result: Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        if let Err(e) = &result {
            self.events.publish(ExportFailed {
                target: target.to_string(),
                error: e.to_string(),
            });
        }
        result
    }

    pub fn export_chart(
        &self,
        index: usize,
        format: ExportFormat,
    ) -> Result<ExportArtifact, ExportError> {
        let Some(chart) = self.charts.get(index) else {
            return self.report_failure("chart", Err(ExportError::EmptyRegion));
        };
        let result = chart.export(
            self.chart_rows(index),
            &self.palette,
            format,
            &self.export_options(),
        );
        self.report_failure(chart.title(), result)
    }

    /// The filtered rows as CSV
    pub fn export_csv(&self) -> Result<ExportArtifact, ExportError> {
        let result = self.exporter().csv(&self.filtered);
        self.report_failure("CSV", result)
    }

    pub fn export_markdown(&self) -> ExportArtifact {
        self.exporter().markdown()
    }

    pub fn export_pdf(&self) -> ExportArtifact {
        self.exporter().pdf()
    }

    /// Frames of every chart, captured together so no chart can start its
    /// own export halfway through
    fn capture_all(&self) -> Result<Vec<ChartFrame>, ExportError> {
        let guards: Vec<_> = self.charts.iter().filter_map(|c| c.begin_capture()).collect();
        if guards.len() != self.charts.len() {
            return Err(ExportError::Busy);
        }
        Ok(self.frames())
    }

    /// Every chart stacked into one PNG
    pub fn export_snapshot_png(&self) -> Result<ExportArtifact, ExportError> {
        let result = self
            .capture_all()
            .and_then(|frames| self.exporter().snapshot_png(&frames));
        self.report_failure("dashboard", result)
    }

    /// Every chart stacked and tiled across PDF pages
    pub fn export_snapshot_pdf(&self) -> Result<ExportArtifact, ExportError> {
        let result = self
            .capture_all()
            .and_then(|frames| self.exporter().snapshot_pdf(&frames));
        self.report_failure("dashboard", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::events::events::ComparisonStarted;
    use dash_core::{row, AnalysisResult, ChartConfig, ChartType};
    use dash_data::FilterOperator;
    use parking_lot::Mutex;

    fn report() -> Report {
        let rows: Vec<DataRow> = (0..120)
            .map(|i| {
                row! {
                    "day" => format!("d{}", i),
                    "region" => if i % 2 == 0 { "East" } else { "West" },
                    "sales" => i,
                }
            })
            .collect();
        let analysis = AnalysisResult {
            summary: "Daily sales".into(),
            suggested_charts: vec![
                ChartConfig::new(ChartType::Line, "Sales trend", "day", "sales"),
                ChartConfig::new(ChartType::Bar, "Sales by day", "day", "sales"),
                ChartConfig::new(ChartType::Pie, "Own data", "k", "v").with_data(vec![
                    row! { "k" => "a", "v" => 1 },
                    row! { "k" => "b", "v" => 2 },
                ]),
            ],
            ..AnalysisResult::default()
        };
        Report::new("daily.json", analysis, rows)
    }

    #[derive(Default)]
    struct Sink {
        received: Mutex<Vec<(usize, String)>>,
    }

    impl ReanalysisSink for Sink {
        fn request_reanalysis(&self, rows: Vec<DataRow>, file_name: &str) {
            self.received.lock().push((rows.len(), file_name.to_string()));
        }
    }

    #[test]
    fn test_filters_rederive_every_view() {
        let mut dashboard = Dashboard::new(report(), DashboardSettings::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        dashboard
            .events()
            .on::<FiltersChanged, _>(move |e| sink.lock().push(e.matched_rows));

        dashboard.set_page(1);
        let id = dashboard.add_filter(FilterRule::new("region", FilterOperator::Equals, "east"));
        assert_eq!(dashboard.filtered_rows().len(), 60);
        assert_eq!(dashboard.chart_rows(0).len(), 60);
        // The table ignores chart filters and keeps its page.
        assert_eq!(dashboard.table_page().total, 120);
        assert_eq!(dashboard.table_query().page, 1);
        // Charts with their own rows are filtered on those rows.
        assert_eq!(dashboard.chart_rows(2).len(), 0);

        assert!(dashboard.remove_filter(&id));
        assert!(!dashboard.remove_filter(&id));
        assert_eq!(dashboard.filtered_rows().len(), 120);
        assert_eq!(dashboard.rows().len(), 120);
        assert_eq!(*seen.lock(), vec![60, 120]);
    }

    #[test]
    fn test_no_matches_gives_empty_frames() {
        let mut dashboard = Dashboard::new(report(), DashboardSettings::default());
        dashboard.add_filter(FilterRule::new("sales", FilterOperator::Gt, "1000"));
        let frame = dashboard.chart_frame(0).unwrap();
        assert!(frame.is_empty());
        assert!(dashboard.chart_frame(9).is_none());
    }

    #[test]
    fn test_comparison_syncs_and_releases_charts() {
        let mut dashboard = Dashboard::new(report(), DashboardSettings::default());
        let started = Arc::new(Mutex::new(0));
        let counter = started.clone();
        dashboard
            .events()
            .on::<ComparisonStarted, _>(move |_| *counter.lock() += 1);

        dashboard.charts()[0].zoom_in();
        dashboard.begin_comparison().unwrap();
        dashboard.toggle_compared(0).unwrap();
        assert_eq!(
            dashboard.synthesize_comparison(),
            Err(ComparisonError::NotEnoughCharts(1))
        );
        dashboard.toggle_compared(1).unwrap();
        dashboard.synthesize_comparison().unwrap();
        assert_eq!(*started.lock(), 1);

        let (a, b) = (&dashboard.charts()[0], &dashboard.charts()[1]);
        assert!(a.is_shared() && b.is_shared());
        assert!(!dashboard.charts()[2].is_shared());
        assert_eq!(a.view_state().zoom, 1.0);
        a.toggle_series("sales");
        assert!(b.view_state().hidden.is_hidden("sales"));

        dashboard.close_comparison().unwrap();
        let a = &dashboard.charts()[0];
        assert!(!a.is_shared());
        assert_eq!(a.view_state().zoom, 1.5);
        assert!(!a.view_state().hidden.is_hidden("sales"));
    }

    #[test]
    fn test_table_search_sort_and_paging() {
        let mut dashboard = Dashboard::new(report(), DashboardSettings::default());
        dashboard.set_page(2);
        let page = dashboard.table_page();
        assert_eq!(page.rows.len(), 20);
        assert_eq!(page.page_count, 3);

        dashboard.sort_by("sales");
        dashboard.sort_by("sales");
        assert_eq!(dashboard.table_query().page, 0);
        let page = dashboard.table_page();
        assert_eq!(page.rows[0].get("sales").as_number(), Some(119.0));

        dashboard.set_search("d11");
        assert_eq!(dashboard.table_page().total, 11);
    }

    #[test]
    fn test_clean_dispatches_without_touching_source() {
        let mut report = report();
        report.data.push(report.data[0].clone());
        let dashboard = Dashboard::new(report, DashboardSettings::default());
        assert_eq!(dashboard.diagnostics().duplicate_rows, 1);

        let sink = Sink::default();
        let options = CleaningOptions {
            remove_duplicates: true,
            ..CleaningOptions::default()
        };
        let outcome = dashboard.clean(&options, &sink);
        assert_eq!((outcome.rows_before, outcome.rows_after), (121, 120));
        assert_eq!(*sink.received.lock(), vec![(120, "daily".to_string())]);
        assert_eq!(dashboard.rows().len(), 121);
    }

    #[test]
    fn test_export_failure_is_published() {
        let dashboard = Dashboard::new(report(), DashboardSettings::default());
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();
        dashboard
            .events()
            .on::<ExportFailed, _>(move |e| sink.lock().push(e.target.clone()));

        let _guard = dashboard.charts()[0].begin_capture();
        assert!(matches!(
            dashboard.export_chart(0, ExportFormat::Svg),
            Err(ExportError::Busy)
        ));
        assert!(matches!(dashboard.export_snapshot_png(), Err(ExportError::Busy)));
        assert_eq!(*failures.lock(), vec!["Sales trend", "dashboard"]);

        let svg = dashboard.export_chart(1, ExportFormat::Svg).unwrap();
        assert_eq!(svg.file_name, "sales-by-day.svg");
        assert_eq!(dashboard.export_csv().unwrap().file_name, "daily.csv");
    }
}
