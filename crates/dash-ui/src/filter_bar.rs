//! Filter rule editor

use dash_data::filter::{FilterOperator, FilterRule};
use egui::{ComboBox, RichText, Ui};

#[derive(Debug, Clone, PartialEq)]
pub enum FilterBarAction {
    Add(FilterRule),
    Remove(String),
    Clear,
}

/// The rule being composed, kept between frames
#[derive(Debug, Clone)]
pub struct FilterDraft {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Default for FilterDraft {
    fn default() -> Self {
        Self {
            column: String::new(),
            operator: FilterOperator::Equals,
            value: String::new(),
        }
    }
}

impl FilterDraft {
    /// Build a rule from the draft. The draft keeps its column and operator
    /// so similar rules are quick to add.
    pub fn take_rule(&mut self) -> Option<FilterRule> {
        if self.column.is_empty() {
            return None;
        }
        let value = std::mem::take(&mut self.value);
        Some(FilterRule::new(self.column.clone(), self.operator, value))
    }
}

/// Draw the editor and the active rules
pub fn filter_bar(
    ui: &mut Ui,
    columns: &[String],
    draft: &mut FilterDraft,
    filters: &[FilterRule],
) -> Vec<FilterBarAction> {
    let mut actions = Vec::new();

    if !columns.contains(&draft.column) {
        draft.column = columns.first().cloned().unwrap_or_default();
    }

    ui.horizontal(|ui| {
        ui.label("Filter");
        ComboBox::from_id_source("filter_column")
            .selected_text(draft.column.as_str())
            .show_ui(ui, |ui| {
                for column in columns {
                    ui.selectable_value(&mut draft.column, column.clone(), column.as_str());
                }
            });
        ComboBox::from_id_source("filter_operator")
            .selected_text(draft.operator.symbol())
            .show_ui(ui, |ui| {
                for op in FilterOperator::ALL {
                    ui.selectable_value(&mut draft.operator, op, op.symbol())
                        .on_hover_text(op.as_str());
                }
            });
        let hint = if draft.operator.is_numeric() { "number" } else { "value" };
        ui.add(egui::TextEdit::singleline(&mut draft.value).hint_text(hint).desired_width(120.0));

        if ui.add_enabled(!columns.is_empty(), egui::Button::new("Add")).clicked() {
            if let Some(rule) = draft.take_rule() {
                actions.push(FilterBarAction::Add(rule));
            }
        }
        if !filters.is_empty() && ui.button("Clear all").clicked() {
            actions.push(FilterBarAction::Clear);
        }
    });

    if !filters.is_empty() {
        ui.horizontal_wrapped(|ui| {
            for rule in filters {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(format!(
                        "{} {} {}",
                        rule.column,
                        rule.operator.symbol(),
                        rule.value
                    )));
                    if ui.small_button("×").on_hover_text("Remove filter").clicked() {
                        actions.push(FilterBarAction::Remove(rule.id.clone()));
                    }
                });
            }
        });
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_needs_a_column() {
        let mut draft = FilterDraft::default();
        draft.value = "10".into();
        assert!(draft.take_rule().is_none());
        assert_eq!(draft.value, "10");
    }

    #[test]
    fn test_draft_keeps_column_and_operator() {
        let mut draft = FilterDraft {
            column: "sales".into(),
            operator: FilterOperator::Gt,
            value: "100".into(),
        };
        let rule = draft.take_rule().unwrap();
        assert_eq!(rule.column, "sales");
        assert_eq!(rule.operator, FilterOperator::Gt);
        assert_eq!(rule.value, "100");
        assert_eq!(draft.column, "sales");
        assert!(draft.value.is_empty());
    }
}
