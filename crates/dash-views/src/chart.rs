//! Chart views and their render model
//!
//! A [`ChartView`] turns a [`ChartConfig`] plus the already-filtered rows
//! into a [`ChartFrame`]: labels, series values, colours and legend state.
//! The frame is what both the egui layer and the image exporters draw, so a
//! chart on screen and its exported image always agree.

use ahash::AHashMap;
use dash_core::{
    ChartConfig, ChartType, ConfigIssue, DataRow, LocalViewState, Palette, Rgb, ViewState,
    ViewStateSource,
};
use dash_data::window::{window_info_with_limit, WindowInfo, DISPLAY_LIMIT};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::export::{self, ExportArtifact, ExportError, ExportFormat, ExportOptions};
use crate::report::slug::slugify;

/// Why a frame has nothing to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The filters left no rows
    NoMatches,
    /// The chart names no value columns
    NoSeries,
}

impl EmptyReason {
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::NoMatches => "No rows match the current filters",
            EmptyReason::NoSeries => "This chart has no value columns",
        }
    }
}

/// Values of one series aligned with the frame's labels
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesData {
    pub key: String,
    pub color: Rgb,
    pub hidden: bool,
    /// `None` where the row has no numeric value
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color: Rgb,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterGroup {
    pub key: String,
    pub color: Rgb,
    pub hidden: bool,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    Empty(EmptyReason),
    /// Bar, line and area charts
    Sequential {
        labels: Vec<String>,
        series: Vec<SeriesData>,
    },
    Radar {
        axes: Vec<String>,
        series: Vec<SeriesData>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    Scatter {
        groups: Vec<ScatterGroup>,
    },
}

/// One legend row; hidden entries stay listed so they can be re-enabled
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub key: String,
    pub color: Rgb,
    pub hidden: bool,
}

impl LegendEntry {
    /// Colour to draw the swatch with
    pub fn swatch(&self) -> Rgb {
        if self.hidden {
            self.color.muted()
        } else {
            self.color
        }
    }
}

/// Everything needed to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub title: String,
    pub chart_type: ChartType,
    pub x_axis: String,
    pub y_axis: String,
    pub body: FrameBody,
    pub legend: Vec<LegendEntry>,
    pub window: WindowInfo,
}

impl ChartFrame {
    pub fn is_empty(&self) -> bool {
        matches!(self.body, FrameBody::Empty(_))
    }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        match self.body {
            FrameBody::Empty(reason) => Some(reason),
            _ => None,
        }
    }

    /// Min and max of every visible value, widened to include zero for
    /// charts drawn from a baseline
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = match &self.body {
            FrameBody::Sequential { series, .. } | FrameBody::Radar { series, .. } => series
                .iter()
                .filter(|s| !s.hidden)
                .flat_map(|s| s.values.iter().flatten().copied())
                .collect(),
            FrameBody::Scatter { groups } => groups
                .iter()
                .filter(|g| !g.hidden)
                .flat_map(|g| g.points.iter().map(|p| p.1))
                .collect(),
            FrameBody::Pie { .. } | FrameBody::Empty(_) => return None,
        };
        let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        if matches!(
            self.chart_type,
            ChartType::Bar | ChartType::Area | ChartType::Radar
        ) {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        if min == max {
            max = min + 1.0;
        }
        Some((min, max))
    }
}

/// Build the render model for `config` over `rows` (already filtered).
///
/// Pure: the same inputs always give the same frame.
pub fn build_frame(
    config: &ChartConfig,
    rows: &[DataRow],
    state: &ViewState,
    palette: &Palette,
    display_limit: usize,
) -> ChartFrame {
    let window = window_info_with_limit(
        rows.len(),
        state.zoom,
        state.pan,
        config.chart_type,
        display_limit,
    );
    let mut frame = ChartFrame {
        title: config.title.clone(),
        chart_type: config.chart_type,
        x_axis: config.x_axis.clone(),
        y_axis: config.y_axis.clone(),
        body: FrameBody::Empty(EmptyReason::NoMatches),
        legend: Vec::new(),
        window,
    };

    if rows.is_empty() {
        return frame;
    }
    let keys = config.series_keys();
    if keys.is_empty() {
        frame.body = FrameBody::Empty(EmptyReason::NoSeries);
        return frame;
    }

    let visible = &rows[window.range()];
    frame.body = match config.chart_type {
        ChartType::Bar | ChartType::Line | ChartType::Area => match &config.category {
            Some(category) if !category.is_empty() => {
                category_series(config, category, rows, visible, state, palette)
            }
            _ => {
                let labels = visible.iter().map(|r| r.get(&config.x_axis).to_string()).collect();
                FrameBody::Sequential {
                    labels,
                    series: row_series(&keys, visible, state, palette),
                }
            }
        },
        ChartType::Radar => FrameBody::Radar {
            axes: visible.iter().map(|r| r.get(&config.x_axis).to_string()).collect(),
            series: row_series(&keys, visible, state, palette),
        },
        ChartType::Pie => pie_slices(config, rows, state, palette),
        ChartType::Scatter => scatter_groups(config, &keys, rows, state, palette),
    };
    frame.legend = legend_for(&frame.body);
    frame
}

fn row_series(
    keys: &[String],
    rows: &[DataRow],
    state: &ViewState,
    palette: &Palette,
) -> Vec<SeriesData> {
    keys.iter()
        .enumerate()
        .map(|(idx, key)| SeriesData {
            key: key.clone(),
            color: palette.color_for(idx),
            hidden: state.hidden.is_hidden(key),
            values: rows.iter().map(|r| r.get(key).as_number()).collect(),
        })
        .collect()
}

/// Split `yAxis` into one series per category value, summed per x label.
/// Additional keys are summed per x label as well.
///
/// Series order (and so color) comes from all of `rows`; only `visible`
/// contributes labels and sums, so panning never reshuffles the legend.
fn category_series(
    config: &ChartConfig,
    category: &str,
    rows: &[DataRow],
    visible: &[DataRow],
    state: &ViewState,
    palette: &Palette,
) -> FrameBody {
    let extra_keys: Vec<&String> = config
        .additional_keys
        .iter()
        .filter(|key| !key.is_empty() && *key != &config.y_axis)
        .collect();

    let mut sums: IndexMap<String, AHashMap<usize, f64>> = IndexMap::new();
    for row in rows {
        let group = row.get(category);
        if !group.is_missing() {
            sums.entry(group.to_string()).or_default();
        }
        for key in &extra_keys {
            sums.entry((*key).clone()).or_default();
        }
    }

    let mut labels: IndexMap<String, usize> = IndexMap::new();
    for row in visible {
        let label = row.get(&config.x_axis).to_string();
        let next = labels.len();
        let slot = *labels.entry(label).or_insert(next);

        let group = row.get(category);
        if !group.is_missing() {
            let entry = sums.entry(group.to_string()).or_default();
            if let Some(v) = row.get(&config.y_axis).as_number() {
                *entry.entry(slot).or_insert(0.0) += v;
            }
        }
        for key in &extra_keys {
            let entry = sums.entry((*key).clone()).or_default();
            if let Some(v) = row.get(key.as_str()).as_number() {
                *entry.entry(slot).or_insert(0.0) += v;
            }
        }
    }

    let series = sums
        .into_iter()
        .enumerate()
        .map(|(idx, (key, by_label))| SeriesData {
            color: palette.color_for(idx),
            hidden: state.hidden.is_hidden(&key),
            values: (0..labels.len()).map(|slot| by_label.get(&slot).copied()).collect(),
            key,
        })
        .collect();

    FrameBody::Sequential {
        labels: labels.into_keys().collect(),
        series,
    }
}

fn pie_slices(
    config: &ChartConfig,
    rows: &[DataRow],
    state: &ViewState,
    palette: &Palette,
) -> FrameBody {
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for row in rows {
        match row.get(&config.y_axis).as_number() {
            Some(v) if v > 0.0 => {
                *totals.entry(row.get(&config.x_axis).to_string()).or_insert(0.0) += v;
            }
            _ => {}
        }
    }

    let slices = totals
        .into_iter()
        .enumerate()
        .map(|(idx, (label, value))| PieSlice {
            color: palette.color_for(idx),
            hidden: state.hidden.is_hidden(&label),
            label,
            value,
        })
        .collect();
    FrameBody::Pie { slices }
}

fn scatter_groups(
    config: &ChartConfig,
    keys: &[String],
    rows: &[DataRow],
    state: &ViewState,
    palette: &Palette,
) -> FrameBody {
    let mut groups: IndexMap<String, Vec<(f64, f64)>> = IndexMap::new();

    match &config.category {
        Some(category) if !category.is_empty() => {
            for row in rows {
                let group = row.get(category);
                if group.is_missing() {
                    continue;
                }
                let points = groups.entry(group.to_string()).or_default();
                if let (Some(x), Some(y)) = (
                    row.get(&config.x_axis).as_number(),
                    row.get(&config.y_axis).as_number(),
                ) {
                    points.push((x, y));
                }
            }
        }
        _ => {
            for key in keys {
                let points = rows
                    .iter()
                    .filter_map(|r| {
                        Some((r.get(&config.x_axis).as_number()?, r.get(key).as_number()?))
                    })
                    .collect();
                groups.insert(key.clone(), points);
            }
        }
    }

    let groups = groups
        .into_iter()
        .enumerate()
        .map(|(idx, (key, points))| ScatterGroup {
            color: palette.color_for(idx),
            hidden: state.hidden.is_hidden(&key),
            key,
            points,
        })
        .collect();
    FrameBody::Scatter { groups }
}

fn legend_for(body: &FrameBody) -> Vec<LegendEntry> {
    match body {
        FrameBody::Empty(_) => Vec::new(),
        FrameBody::Sequential { series, .. } | FrameBody::Radar { series, .. } => series
            .iter()
            .map(|s| LegendEntry {
                key: s.key.clone(),
                color: s.color,
                hidden: s.hidden,
            })
            .collect(),
        FrameBody::Pie { slices } => slices
            .iter()
            .map(|s| LegendEntry {
                key: s.label.clone(),
                color: s.color,
                hidden: s.hidden,
            })
            .collect(),
        FrameBody::Scatter { groups } => groups
            .iter()
            .map(|g| LegendEntry {
                key: g.key.clone(),
                color: g.color,
                hidden: g.hidden,
            })
            .collect(),
    }
}

/// Clears the chart's capture flag when dropped
pub struct CaptureGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One chart on the dashboard
pub struct ChartView {
    config: ChartConfig,
    local: Arc<LocalViewState>,
    source: Arc<dyn ViewStateSource>,
    capturing: Arc<AtomicBool>,
    issues: Vec<ConfigIssue>,
    display_limit: usize,
}

impl ChartView {
    /// Create a chart, checking its column references against `rows`.
    ///
    /// Unknown columns are logged and left to render as gaps.
    pub fn new(config: ChartConfig, rows: &[DataRow]) -> Self {
        let issues = config.validate(rows);
        for issue in &issues {
            warn!("Chart '{}': {}", config.title, issue);
        }
        let local = Arc::new(LocalViewState::new());
        Self {
            config,
            source: local.clone(),
            local,
            capturing: Arc::new(AtomicBool::new(false)),
            issues,
            display_limit: DISPLAY_LIMIT,
        }
    }

    pub fn with_display_limit(mut self, display_limit: usize) -> Self {
        self.display_limit = display_limit.max(1);
        self
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn issues(&self) -> &[ConfigIssue] {
        &self.issues
    }

    /// The chart's own state, used whenever it is not in a comparison
    pub fn local(&self) -> Arc<LocalViewState> {
        self.local.clone()
    }

    /// Read and write view state through `source` from now on
    pub fn attach(&mut self, source: Arc<dyn ViewStateSource>) {
        self.source = source;
    }

    /// Go back to the chart's own state
    pub fn detach(&mut self) {
        self.source = self.local.clone();
    }

    pub fn is_shared(&self) -> bool {
        self.source.is_shared()
    }

    pub fn view_state(&self) -> ViewState {
        self.source.get()
    }

    pub fn toggle_series(&self, key: &str) {
        debug!("Chart '{}': toggle series '{}'", self.config.title, key);
        self.source.toggle_series(key);
    }

    pub fn zoom_in(&self) {
        self.source.zoom_in();
    }

    pub fn zoom_out(&self) {
        self.source.zoom_out();
    }

    pub fn set_pan(&self, pan: f64) {
        self.source.set_pan(pan);
    }

    pub fn reset_view(&self) {
        self.source.reset();
    }

    /// Render model for `rows`, which must already be filtered
    pub fn frame(&self, rows: &[DataRow], palette: &Palette) -> ChartFrame {
        build_frame(
            &self.config,
            rows,
            &self.source.get(),
            palette,
            self.display_limit,
        )
    }

    /// Mark the chart as capturing. `None` while another capture runs.
    pub fn begin_capture(&self) -> Option<CaptureGuard> {
        self.capturing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CaptureGuard {
                flag: self.capturing.clone(),
            })
    }

    /// Whether interactive chrome should be hidden
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::Acquire)
    }

    /// Snapshot the chart region as an image.
    ///
    /// Failures are logged and returned; view state is never touched.
    pub fn export(
        &self,
        rows: &[DataRow],
        palette: &Palette,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<ExportArtifact, ExportError> {
        let Some(_guard) = self.begin_capture() else {
            warn!("Chart '{}': export already in progress", self.config.title);
            return Err(ExportError::Busy);
        };

        let frame = self.frame(rows, palette);
        let result = export::render(&frame, format, options).map(|bytes| ExportArtifact {
            file_name: format!("{}.{}", slugify(&self.config.title, "chart"), format.extension()),
            mime: format.mime(),
            bytes,
        });
        if let Err(e) = &result {
            error!("Chart '{}': export failed: {}", self.config.title, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{row, DataValue, SharedViewState};

    fn sales() -> Vec<DataRow> {
        vec![
            row! { "month" => "Jan", "region" => "East", "sales" => 10, "cost" => 4 },
            row! { "month" => "Jan", "region" => "West", "sales" => 20, "cost" => 6 },
            row! { "month" => "Feb", "region" => "East", "sales" => 30, "cost" => "n/a" },
        ]
    }

    fn line() -> ChartConfig {
        ChartConfig::new(ChartType::Line, "Sales", "month", "sales").with_additional_keys(["cost"])
    }

    #[test]
    fn test_sequential_frame() {
        let view = ChartView::new(line(), &sales());
        let frame = view.frame(&sales(), &Palette::indigo());
        let FrameBody::Sequential { labels, series } = &frame.body else {
            panic!("expected sequential body");
        };
        assert_eq!(labels, &vec!["Jan", "Jan", "Feb"]);
        assert_eq!(series[0].values, vec![Some(10.0), Some(20.0), Some(30.0)]);
        assert_eq!(series[1].values, vec![Some(4.0), Some(6.0), None]);
        assert_eq!(frame.value_range(), Some((4.0, 30.0)));
    }

    #[test]
    fn test_hidden_series_keep_color_slot() {
        let palette = Palette::indigo();
        let view = ChartView::new(line(), &sales());
        view.toggle_series("sales");
        let frame = view.frame(&sales(), &palette);

        assert_eq!(frame.legend.len(), 2);
        assert!(frame.legend[0].hidden);
        assert_eq!(frame.legend[0].swatch(), palette.color_for(0).muted());
        assert_eq!(frame.legend[1].color, palette.color_for(1));
        assert!(!frame.legend[1].hidden);
    }

    #[test]
    fn test_category_splits_and_sums() {
        let config = ChartConfig::new(ChartType::Bar, "By region", "month", "sales")
            .with_category("region");
        let frame = build_frame(&config, &sales(), &ViewState::default(), &Palette::indigo(), 100);
        let FrameBody::Sequential { labels, series } = frame.body else {
            panic!("expected sequential body");
        };
        assert_eq!(labels, vec!["Jan", "Feb"]);
        assert_eq!(series[0].key, "East");
        assert_eq!(series[0].values, vec![Some(10.0), Some(30.0)]);
        assert_eq!(series[1].key, "West");
        assert_eq!(series[1].values, vec![Some(20.0), None]);
    }

    #[test]
    fn test_category_order_survives_zoom_and_pan() {
        let rows: Vec<DataRow> = (0..250)
            .map(|i| {
                let region = if i < 125 { "West" } else { "East" };
                row! { "i" => i, "region" => region, "sales" => 1 }
            })
            .collect();
        let config =
            ChartConfig::new(ChartType::Bar, "By region", "i", "sales").with_category("region");
        let palette = Palette::indigo();

        let whole = build_frame(&config, &rows, &ViewState::default(), &palette, 100);
        let state = ViewState::default().with_zoom(2.0).with_pan(1.0);
        let panned = build_frame(&config, &rows, &state, &palette, 100);
        assert_eq!(panned.window.start, 125);

        let keys = |frame: &ChartFrame| -> Vec<String> {
            frame.legend.iter().map(|entry| entry.key.clone()).collect()
        };
        assert_eq!(keys(&whole), vec!["West", "East"]);
        assert_eq!(keys(&panned), keys(&whole));
        assert_eq!(panned.legend[1].color, whole.legend[1].color);
        assert_eq!(panned.legend[1].color, palette.color_for(1));

        let FrameBody::Sequential { series, .. } = panned.body else {
            panic!("expected sequential body");
        };
        assert!(series[0].values.iter().all(Option::is_none));
        assert!(series[1].values.iter().all(|v| *v == Some(1.0)));
    }

    #[test]
    fn test_zero_rows_is_explicit_empty_state() {
        let view = ChartView::new(line(), &sales());
        let frame = view.frame(&[], &Palette::indigo());
        assert_eq!(frame.empty_reason(), Some(EmptyReason::NoMatches));
        assert!(frame.legend.is_empty());
    }

    #[test]
    fn test_unknown_columns_degrade() {
        let config = ChartConfig::new(ChartType::Line, "Broken", "month", "profit");
        let view = ChartView::new(config, &sales());
        assert_eq!(view.issues().len(), 1);

        let frame = view.frame(&sales(), &Palette::indigo());
        let FrameBody::Sequential { series, .. } = frame.body else {
            panic!("expected sequential body");
        };
        assert!(series[0].values.iter().all(Option::is_none));
    }

    #[test]
    fn test_pie_ignores_zoom_and_skips_non_positive() {
        let rows = vec![
            row! { "region" => "East", "sales" => 10 },
            row! { "region" => "West", "sales" => -5 },
            row! { "region" => "East", "sales" => 5 },
            row! { "region" => "North", "sales" => DataValue::Null },
        ];
        let config = ChartConfig::new(ChartType::Pie, "Share", "region", "sales");
        let state = ViewState::default().with_zoom(5.0);
        let frame = build_frame(&config, &rows, &state, &Palette::indigo(), 100);
        let FrameBody::Pie { slices } = frame.body else {
            panic!("expected pie body");
        };
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "East");
        assert_eq!(slices[0].value, 15.0);
        assert_eq!(frame.window.len, 4);
    }

    #[test]
    fn test_scatter_groups_by_category() {
        let rows = vec![
            row! { "x" => 1, "y" => 2, "kind" => "a" },
            row! { "x" => 2, "y" => "bad", "kind" => "a" },
            row! { "x" => 3, "y" => 1, "kind" => "b" },
        ];
        let config = ChartConfig::new(ChartType::Scatter, "Spread", "x", "y").with_category("kind");
        let frame = build_frame(&config, &rows, &ViewState::default(), &Palette::indigo(), 100);
        let FrameBody::Scatter { groups } = frame.body else {
            panic!("expected scatter body");
        };
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].points, vec![(1.0, 2.0)]);
        assert_eq!(groups[1].key, "b");
    }

    #[test]
    fn test_zoom_narrows_window() {
        let rows: Vec<DataRow> = (0..250).map(|i| row! { "i" => i, "v" => i }).collect();
        let config = ChartConfig::new(ChartType::Area, "Trend", "i", "v");
        let view = ChartView::new(config, &rows);
        view.zoom_in();
        view.zoom_in();
        view.set_pan(1.0);
        let frame = view.frame(&rows, &Palette::indigo());
        assert_eq!(frame.window.start, 125);
        assert_eq!(frame.window.len, 125);
    }

    #[test]
    fn test_attach_and_detach_shared_state() {
        let mut view = ChartView::new(line(), &sales());
        view.zoom_in();
        let shared = SharedViewState::new();
        view.attach(Arc::new(shared.clone()));
        assert!(view.is_shared());
        assert_eq!(view.view_state().zoom, 1.0);

        view.zoom_in();
        assert_eq!(shared.get().zoom, 1.5);
        view.detach();
        assert_eq!(view.view_state().zoom, 1.5);
        assert_eq!(view.local().get().zoom, 1.5);
    }

    #[test]
    fn test_capture_guard_rejects_second_capture() {
        let view = ChartView::new(line(), &sales());
        let guard = view.begin_capture();
        assert!(guard.is_some());
        assert!(view.is_capturing());
        assert!(view.begin_capture().is_none());
        assert!(matches!(
            view.export(&sales(), &Palette::indigo(), ExportFormat::Svg, &ExportOptions::default()),
            Err(ExportError::Busy)
        ));
        drop(guard);
        assert!(!view.is_capturing());
    }
}
