//! Dashboard widgets and theme

pub mod cleaning_panel;
pub mod comparison_tray;
pub mod filter_bar;
pub mod report_panel;
pub mod theme;
pub mod toasts;

pub use cleaning_panel::cleaning_panel;
pub use comparison_tray::{comparison_tray, ComparisonAction};
pub use filter_bar::{filter_bar, FilterBarAction, FilterDraft};
pub use report_panel::report_summary;
pub use theme::{apply_theme, Theme};
pub use toasts::{ToastKind, Toasts};

/// Small icon-style button with a hover tooltip
pub fn icon_button(ui: &mut egui::Ui, icon: &str, tooltip: &str) -> egui::Response {
    ui.add(egui::Button::new(icon)).on_hover_text(tooltip)
}
