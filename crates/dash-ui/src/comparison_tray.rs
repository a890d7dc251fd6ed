//! Comparison workflow controls

use dash_core::comparison::MIN_COMPARED_CHARTS;
use dash_core::{ComparisonCoordinator, ComparisonState};
use egui::{RichText, Ui};

use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonAction {
    Begin,
    Cancel,
    Synthesize,
    Reset,
    Close,
}

/// Buttons for the coordinator's current state
pub fn comparison_tray(
    ui: &mut Ui,
    coordinator: &ComparisonCoordinator,
) -> Option<ComparisonAction> {
    let mut action = None;
    ui.horizontal(|ui| match coordinator.state() {
        ComparisonState::Idle => {
            if ui.button("Compare charts").clicked() {
                action = Some(ComparisonAction::Begin);
            }
        }
        ComparisonState::Selecting { selected } => {
            ui.label(format!("{} selected", selected.len()));
            let ready = selected.len() >= MIN_COMPARED_CHARTS;
            if ui
                .add_enabled(ready, egui::Button::new("Synthesize"))
                .on_disabled_hover_text(format!("Pick at least {} charts", MIN_COMPARED_CHARTS))
                .clicked()
            {
                action = Some(ComparisonAction::Synthesize);
            }
            if ui.button("Cancel").clicked() {
                action = Some(ComparisonAction::Cancel);
            }
        }
        ComparisonState::Synced { charts, .. } => {
            ui.label(
                RichText::new(format!("Comparing {} charts", charts.len()))
                    .color(theme::accent_color()),
            );
            if ui.button("Reset").on_hover_text("Zoom 1x, centred, all series").clicked() {
                action = Some(ComparisonAction::Reset);
            }
            if ui.button("Close").clicked() {
                action = Some(ComparisonAction::Close);
            }
        }
    });
    action
}
