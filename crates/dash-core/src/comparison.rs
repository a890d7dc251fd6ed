//! Multi-chart comparison
//!
//! The coordinator walks `Idle → Selecting → Synced → Idle`. While synced it
//! owns a single [`SharedViewState`] and hands a clone to every participant;
//! everyone else keeps using their own local state.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::events::{
    events::{ComparisonClosed, ComparisonStarted},
    EventBus,
};
use crate::view_state::{LocalViewState, SharedViewState, ViewStateSource};

/// Minimum number of charts a synced session needs
pub const MIN_COMPARED_CHARTS: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("comparison needs at least 2 charts, {0} selected")]
    NotEnoughCharts(usize),
}

/// Coordinator state
#[derive(Debug, Clone, Default)]
pub enum ComparisonState {
    #[default]
    Idle,
    Selecting {
        /// Chart indices in the order they were picked
        selected: Vec<usize>,
    },
    Synced {
        charts: Vec<usize>,
        shared: SharedViewState,
    },
}

impl ComparisonState {
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonState::Idle => "idle",
            ComparisonState::Selecting { .. } => "selecting",
            ComparisonState::Synced { .. } => "synced",
        }
    }
}

/// Drives the comparison state machine for one dashboard
#[derive(Default)]
pub struct ComparisonCoordinator {
    state: ComparisonState,
    events: Option<Arc<EventBus>>,
}

impl ComparisonCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish transitions on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn state(&self) -> &ComparisonState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ComparisonState::Idle)
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, ComparisonState::Selecting { .. })
    }

    pub fn is_synced(&self) -> bool {
        matches!(self.state, ComparisonState::Synced { .. })
    }

    /// Charts currently selected (Selecting) or compared (Synced)
    pub fn charts(&self) -> &[usize] {
        match &self.state {
            ComparisonState::Idle => &[],
            ComparisonState::Selecting { selected } => selected,
            ComparisonState::Synced { charts, .. } => charts,
        }
    }

    pub fn is_selected(&self, chart: usize) -> bool {
        self.charts().contains(&chart)
    }

    /// The session's shared state, if synced
    pub fn shared(&self) -> Option<&SharedViewState> {
        match &self.state {
            ComparisonState::Synced { shared, .. } => Some(shared),
            _ => None,
        }
    }

    /// Enter compare mode
    pub fn begin_selection(&mut self) -> Result<(), ComparisonError> {
        self.expect_idle("begin selection")?;
        self.state = ComparisonState::Selecting {
            selected: Vec::new(),
        };
        info!("Comparison selection started");
        Ok(())
    }

    /// Add `chart` to the selection, or remove it if already picked
    pub fn toggle_chart(&mut self, chart: usize) -> Result<(), ComparisonError> {
        let state = self.state.name();
        let ComparisonState::Selecting { selected } = &mut self.state else {
            return Err(ComparisonError::InvalidTransition {
                action: "toggle a chart",
                state,
            });
        };

        if let Some(pos) = selected.iter().position(|&c| c == chart) {
            selected.remove(pos);
        } else {
            selected.push(chart);
        }
        debug!("Comparison selection now {:?}", selected);
        Ok(())
    }

    /// Leave compare mode, dropping the selection
    pub fn cancel(&mut self) -> Result<(), ComparisonError> {
        self.expect_selecting("cancel")?;
        self.state = ComparisonState::Idle;
        info!("Comparison selection cancelled");
        Ok(())
    }

    /// Start a synced session over the selected charts with a fresh shared
    /// state
    pub fn synthesize(&mut self) -> Result<SharedViewState, ComparisonError> {
        let state = self.state.name();
        let ComparisonState::Selecting { selected } = &self.state else {
            return Err(ComparisonError::InvalidTransition {
                action: "synthesize",
                state,
            });
        };
        if selected.len() < MIN_COMPARED_CHARTS {
            return Err(ComparisonError::NotEnoughCharts(selected.len()));
        }

        let charts = selected.clone();
        let shared = SharedViewState::new();
        info!("Comparison synced across charts {:?}", charts);

        if let Some(bus) = &self.events {
            bus.publish(ComparisonStarted {
                charts: charts.clone(),
            });
        }
        self.state = ComparisonState::Synced {
            charts,
            shared: shared.clone(),
        };
        Ok(shared)
    }

    /// Restore the shared state to its defaults without leaving the session
    pub fn reset(&mut self) -> Result<(), ComparisonError> {
        let state = self.state.name();
        match &self.state {
            ComparisonState::Synced { shared, .. } => {
                shared.reset();
                debug!("Comparison view state reset");
                Ok(())
            }
            _ => Err(ComparisonError::InvalidTransition {
                action: "reset",
                state,
            }),
        }
    }

    /// End the session and discard the shared state
    pub fn close(&mut self) -> Result<(), ComparisonError> {
        if !self.is_synced() {
            return Err(ComparisonError::InvalidTransition {
                action: "close",
                state: self.state.name(),
            });
        }
        let charts = match std::mem::take(&mut self.state) {
            ComparisonState::Synced { charts, .. } => charts,
            _ => Vec::new(),
        };

        info!("Comparison closed for charts {:?}", charts);
        if let Some(bus) = &self.events {
            bus.publish(ComparisonClosed { charts });
        }
        Ok(())
    }

    /// The view state `chart` should read and write right now
    pub fn source_for(
        &self,
        chart: usize,
        local: Arc<LocalViewState>,
    ) -> Arc<dyn ViewStateSource> {
        match &self.state {
            ComparisonState::Synced { charts, shared } if charts.contains(&chart) => {
                Arc::new(shared.clone())
            }
            _ => local,
        }
    }

    fn expect_idle(&self, action: &'static str) -> Result<(), ComparisonError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(ComparisonError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }

    fn expect_selecting(&self, action: &'static str) -> Result<(), ComparisonError> {
        if self.is_selecting() {
            Ok(())
        } else {
            Err(ComparisonError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_state::ViewState;
    use parking_lot::Mutex;

    fn synced(charts: &[usize]) -> ComparisonCoordinator {
        let mut coordinator = ComparisonCoordinator::new();
        coordinator.begin_selection().unwrap();
        for &c in charts {
            coordinator.toggle_chart(c).unwrap();
        }
        coordinator.synthesize().unwrap();
        coordinator
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut coordinator = ComparisonCoordinator::new();
        coordinator.begin_selection().unwrap();
        coordinator.toggle_chart(1).unwrap();
        coordinator.toggle_chart(3).unwrap();
        coordinator.toggle_chart(1).unwrap();
        assert_eq!(coordinator.charts(), &[3]);

        coordinator.cancel().unwrap();
        assert!(coordinator.is_idle());
        assert!(coordinator.charts().is_empty());
    }

    #[test]
    fn test_synthesize_needs_two_charts() {
        let mut coordinator = ComparisonCoordinator::new();
        coordinator.begin_selection().unwrap();
        coordinator.toggle_chart(0).unwrap();
        assert_eq!(
            coordinator.synthesize().unwrap_err(),
            ComparisonError::NotEnoughCharts(1)
        );
        assert!(coordinator.is_selecting());
    }

    #[test]
    fn test_invalid_transitions_leave_state() {
        let mut coordinator = ComparisonCoordinator::new();
        assert!(coordinator.toggle_chart(0).is_err());
        assert!(coordinator.close().is_err());
        assert!(coordinator.reset().is_err());
        assert!(coordinator.cancel().is_err());
        assert!(coordinator.is_idle());

        let mut coordinator = synced(&[0, 1]);
        assert!(coordinator.begin_selection().is_err());
        assert!(coordinator.toggle_chart(2).is_err());
        assert_eq!(coordinator.charts(), &[0, 1]);
    }

    #[test]
    fn test_synced_zoom_reaches_every_participant() {
        let locals: Vec<_> = (0..4).map(|_| Arc::new(LocalViewState::new())).collect();
        let mut coordinator = synced(&[0, 1, 2]);

        let sources: Vec<_> = locals
            .iter()
            .enumerate()
            .map(|(i, l)| coordinator.source_for(i, l.clone()))
            .collect();
        sources[1].set_zoom(3.0);

        for source in &sources[..3] {
            assert!(source.is_shared());
            assert_eq!(source.get().zoom, 3.0);
        }
        assert!(!sources[3].is_shared());
        assert_eq!(sources[3].get().zoom, 1.0);
        assert_eq!(locals[1].get(), ViewState::default());

        coordinator.close().unwrap();
        coordinator.begin_selection().unwrap();
        for (i, local) in locals.iter().enumerate() {
            assert_eq!(coordinator.source_for(i, local.clone()).get().zoom, 1.0);
        }
    }

    #[test]
    fn test_reset_keeps_session() {
        let mut coordinator = synced(&[0, 2]);
        let shared = coordinator.shared().cloned().unwrap();
        shared.set_zoom(4.0);
        shared.toggle_series("profit");

        coordinator.reset().unwrap();
        assert!(coordinator.is_synced());
        assert_eq!(shared.get(), ViewState::default());
    }

    #[test]
    fn test_each_session_gets_fresh_state() {
        let mut coordinator = synced(&[0, 1]);
        let first = coordinator.shared().cloned().unwrap();
        first.set_pan(0.0);
        coordinator.close().unwrap();

        coordinator.begin_selection().unwrap();
        coordinator.toggle_chart(0).unwrap();
        coordinator.toggle_chart(1).unwrap();
        let second = coordinator.synthesize().unwrap();
        assert!(!first.same_session(&second));
        assert_eq!(second.get().pan, 0.5);
    }

    #[test]
    fn test_transitions_are_published() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let started = log.clone();
        bus.on::<ComparisonStarted, _>(move |e| {
            started.lock().push(format!("start {:?}", e.charts))
        });
        let closed = log.clone();
        bus.on::<ComparisonClosed, _>(move |e| closed.lock().push(format!("close {:?}", e.charts)));

        let mut coordinator = ComparisonCoordinator::new().with_events(bus);
        coordinator.begin_selection().unwrap();
        coordinator.toggle_chart(2).unwrap();
        coordinator.toggle_chart(0).unwrap();
        coordinator.synthesize().unwrap();
        coordinator.close().unwrap();

        assert_eq!(*log.lock(), vec!["start [2, 0]", "close [2, 0]"]);
    }
}
