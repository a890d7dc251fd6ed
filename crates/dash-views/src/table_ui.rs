//! Paged data table with search and sortable headers

use dash_data::table::{TablePage, TableQuery};
use egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

/// Longest cell text shown before truncating
const MAX_CELL_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    Search(String),
    Sort(String),
    Page(usize),
}

fn truncate(text: String) -> String {
    if text.chars().count() > MAX_CELL_CHARS {
        let cut: String = text.chars().take(MAX_CELL_CHARS).collect();
        format!("{}…", cut)
    } else {
        text
    }
}

pub fn data_table(ui: &mut Ui, page: &TablePage, query: &TableQuery) -> Vec<TableAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        let mut search = query.search.clone();
        let response = ui.add(egui::TextEdit::singleline(&mut search).hint_text("Search rows…"));
        if response.changed() {
            actions.push(TableAction::Search(search));
        }
        ui.label(RichText::new(format!("{} matching rows", page.total)).weak());
    });

    if page.columns.is_empty() {
        ui.label(RichText::new("No data").weak());
        return actions;
    }

    let text_height = egui::TextStyle::Body.resolve(ui.style()).size * 1.5;
    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .min_scrolled_height(0.0)
        .max_scroll_height(400.0)
        .vscroll(true);
    for _ in &page.columns {
        builder = builder.column(Column::initial(140.0).at_least(60.0).at_most(400.0).clip(true));
    }

    builder
        .header(22.0, |mut header| {
            for column in &page.columns {
                header.col(|ui| {
                    let arrow = match &query.sort {
                        Some(sort) if &sort.column == column => sort.direction.arrow(),
                        _ => "",
                    };
                    let label = RichText::new(format!("{} {}", column, arrow)).strong();
                    if ui.add(egui::Button::new(label).frame(false)).clicked() {
                        actions.push(TableAction::Sort(column.clone()));
                    }
                });
            }
        })
        .body(|body| {
            body.rows(text_height, page.rows.len(), |row_index, mut row| {
                let data = &page.rows[row_index];
                for column in &page.columns {
                    row.col(|ui| {
                        ui.label(truncate(data.get(column).to_string()));
                    });
                }
            });
        });

    ui.horizontal(|ui| {
        if ui.add_enabled(page.page > 0, egui::Button::new("◀ Prev")).clicked() {
            actions.push(TableAction::Page(page.page - 1));
        }
        ui.label(format!("Page {} of {}", page.page + 1, page.page_count));
        if ui
            .add_enabled(page.page + 1 < page.page_count, egui::Button::new("Next ▶"))
            .clicked()
        {
            actions.push(TableAction::Page(page.page + 1));
        }
    });
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short".into()), "short");
        let long = "é".repeat(60);
        let cut = truncate(long);
        assert_eq!(cut.chars().count(), MAX_CELL_CHARS + 1);
        assert!(cut.ends_with('…'));
    }
}
