//! Cleaning options form with dataset diagnostics

use dash_data::cleaning::{CleaningDiagnostics, CleaningOptions, MissingStrategy};
use egui::{ComboBox, Grid, RichText, Ui};

use crate::theme;

/// Draw the form. Returns the options when the user hits "Clean".
pub fn cleaning_panel(
    ui: &mut Ui,
    diagnostics: &CleaningDiagnostics,
    options: &mut CleaningOptions,
) -> Option<CleaningOptions> {
    ui.heading("Data cleaning");

    Grid::new("cleaning_diagnostics").num_columns(2).striped(true).show(ui, |ui| {
        for (label, count) in [
            ("Rows", diagnostics.total_rows),
            ("Missing cells", diagnostics.missing_cells),
            ("Rows with missing values", diagnostics.rows_with_missing),
            ("Duplicate rows", diagnostics.duplicate_rows),
            ("Cells with stray whitespace", diagnostics.untrimmed_cells),
        ] {
            ui.label(label);
            let text = RichText::new(count.to_string());
            if count > 0 && label != "Rows" {
                ui.label(text.color(theme::warning_color()));
            } else {
                ui.label(text);
            }
            ui.end_row();
        }
    });

    if diagnostics.is_clean() {
        ui.label(RichText::new("No issues found").color(theme::success_color()));
    }
    ui.separator();

    ComboBox::from_label("Missing values")
        .selected_text(options.handle_missing.label())
        .show_ui(ui, |ui| {
            for strategy in MissingStrategy::ALL {
                ui.selectable_value(&mut options.handle_missing, strategy, strategy.label());
            }
        });
    if options.handle_missing == MissingStrategy::ImputeZero {
        ui.checkbox(&mut options.zero_fill_text, "Also fill text columns with 0");
    }
    ui.checkbox(&mut options.remove_duplicates, "Remove duplicate rows");
    ui.checkbox(&mut options.standardize_text, "Trim whitespace");

    if ui.button("Clean and re-analyze").clicked() {
        Some(options.clone())
    } else {
        None
    }
}
