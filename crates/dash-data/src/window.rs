//! Zoom/pan windowing for sequential charts
//!
//! At zoom 1 a chart shows a preview of the first [`DISPLAY_LIMIT`] rows.
//! Zooming in narrows the view to `n / zoom` rows and pan slides that window
//! from the start (`0`) to the end (`1`) of the dataset.

use dash_core::{ChartType, DataRow};
use std::fmt;
use std::ops::Range;

/// Rows shown by a sequential chart when not zoomed
pub const DISPLAY_LIMIT: usize = 100;

/// Smallest window a zoomed chart will show
pub const MIN_WINDOW: usize = 2;

/// Position of a window within the filtered rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    pub start: usize,
    pub len: usize,
    pub total: usize,
}

impl WindowInfo {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Whether the window hides any rows
    pub fn is_partial(&self) -> bool {
        self.len < self.total
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "no rows")
        } else {
            write!(f, "rows {}–{} of {}", self.start + 1, self.end(), self.total)
        }
    }
}

/// Compute the window over `total` rows with the default display limit
pub fn window_info(total: usize, zoom: f64, pan: f64, chart_type: ChartType) -> WindowInfo {
    window_info_with_limit(total, zoom, pan, chart_type, DISPLAY_LIMIT)
}

/// Compute the window over `total` rows.
///
/// A NaN zoom is treated as 1 and a NaN pan as 0.
pub fn window_info_with_limit(
    total: usize,
    zoom: f64,
    pan: f64,
    chart_type: ChartType,
    display_limit: usize,
) -> WindowInfo {
    let whole = WindowInfo {
        start: 0,
        len: total,
        total,
    };
    if !chart_type.is_windowed() || total < MIN_WINDOW {
        return whole;
    }

    if zoom.is_nan() || zoom <= 1.0 {
        return WindowInfo {
            start: 0,
            len: total.min(display_limit.max(MIN_WINDOW)),
            total,
        };
    }

    let pan = if pan.is_nan() { 0.0 } else { pan.clamp(0.0, 1.0) };
    let len = ((total as f64 / zoom).floor() as usize).clamp(MIN_WINDOW, total);
    let start = (((total - len) as f64) * pan).round() as usize;
    WindowInfo {
        start: start.min(total - len),
        len,
        total,
    }
}

/// The visible slice of `rows` for the given zoom and pan
pub fn window(rows: &[DataRow], zoom: f64, pan: f64, chart_type: ChartType) -> &[DataRow] {
    &rows[window_info(rows.len(), zoom, pan, chart_type).range()]
}

/// [`window`] with a configurable unzoomed display limit
pub fn window_with_limit(
    rows: &[DataRow],
    zoom: f64,
    pan: f64,
    chart_type: ChartType,
    display_limit: usize,
) -> &[DataRow] {
    &rows[window_info_with_limit(rows.len(), zoom, pan, chart_type, display_limit).range()]
}
