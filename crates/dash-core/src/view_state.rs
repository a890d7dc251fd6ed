//! Zoom, pan and series-visibility state for a chart
//!
//! Charts never branch on "am I in a comparison?". Each chart is handed a
//! [`ViewStateSource`] at construction: a [`LocalViewState`] it owns, or a
//! [`SharedViewState`] handed out by the comparison coordinator.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::visibility::SeriesVisibility;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_STEP: f64 = 0.5;
pub const DEFAULT_PAN: f64 = 0.5;

/// The `{zoom, pan, hidden}` tuple driving one or more charts
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Zoom factor in `[1, 5]`
    pub zoom: f64,
    /// Window position in `[0, 1]`
    pub pan: f64,
    pub hidden: SeriesVisibility,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: MIN_ZOOM,
            pan: DEFAULT_PAN,
            hidden: SeriesVisibility::new(),
        }
    }
}

impl ViewState {
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = clamp_zoom(zoom);
        self
    }

    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = clamp_pan(pan);
        self
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > MIN_ZOOM
    }
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        MIN_ZOOM
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

pub fn clamp_pan(pan: f64) -> f64 {
    if pan.is_nan() {
        0.0
    } else {
        pan.clamp(0.0, 1.0)
    }
}

/// Read/write access to a chart's view state
pub trait ViewStateSource: Send + Sync {
    fn get(&self) -> ViewState;

    fn set(&self, state: ViewState);

    /// Whether writes are visible to other charts
    fn is_shared(&self) -> bool {
        false
    }

    fn set_zoom(&self, zoom: f64) {
        let state = self.get().with_zoom(zoom);
        self.set(state);
    }

    fn set_pan(&self, pan: f64) {
        let state = self.get().with_pan(pan);
        self.set(state);
    }

    fn zoom_in(&self) {
        let zoom = self.get().zoom + ZOOM_STEP;
        self.set_zoom(zoom);
    }

    fn zoom_out(&self) {
        let zoom = self.get().zoom - ZOOM_STEP;
        self.set_zoom(zoom);
    }

    /// Flip the visibility of one series
    fn toggle_series(&self, key: &str) {
        let mut state = self.get();
        state.hidden = state.hidden.toggled(key);
        self.set(state);
    }

    fn reset(&self) {
        self.set(ViewState::default());
    }
}

/// View state owned by a single chart
#[derive(Debug, Default)]
pub struct LocalViewState {
    state: RwLock<ViewState>,
}

impl LocalViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ViewState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl ViewStateSource for LocalViewState {
    fn get(&self) -> ViewState {
        self.state.read().clone()
    }

    fn set(&self, state: ViewState) {
        *self.state.write() = state;
    }
}

/// Handle onto the single state cell of a comparison session.
///
/// Clones point at the same cell, so a write through any participant is
/// seen by all of them.
#[derive(Debug, Clone, Default)]
pub struct SharedViewState {
    cell: Arc<RwLock<ViewState>>,
}

impl SharedViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two handles refer to the same session cell
    pub fn same_session(&self, other: &SharedViewState) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl ViewStateSource for SharedViewState {
    fn get(&self) -> ViewState {
        self.cell.read().clone()
    }

    fn set(&self, state: ViewState) {
        *self.cell.write() = state;
    }

    fn is_shared(&self) -> bool {
        true
    }
}
