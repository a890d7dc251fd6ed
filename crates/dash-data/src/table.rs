//! Data table queries: search, sort and pagination

use dash_core::{column_union, DataRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Rows rendered per table page
pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "⏶",
            SortDirection::Desc => "⏷",
        }
    }
}

/// Active sort column and direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Next sort after a header click: a new column starts ascending, the
    /// same column flips direction
    pub fn click(current: Option<&SortState>, column: &str) -> SortState {
        match current {
            Some(sort) if sort.column == column => SortState::new(column, sort.direction.flipped()),
            _ => SortState::new(column, SortDirection::Asc),
        }
    }
}

/// Parameters of a table view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub search: String,
    pub sort: Option<SortState>,
    /// Zero-based page index
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            page: 0,
            page_size: PAGE_SIZE,
        }
    }
}

/// One page of table rows
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    pub columns: Vec<String>,
    pub rows: Vec<DataRow>,
    /// Rows matching the search, across all pages
    pub total: usize,
    pub page: usize,
    pub page_count: usize,
}

impl TablePage {
    /// Whether more rows matched than this page shows
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total
    }
}

/// Whether any field of `row` contains `term`, ignoring case
pub fn row_matches(row: &DataRow, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    row.values()
        .any(|value| value.to_string().to_lowercase().contains(&term))
}

/// Stable comparison of two rows on `sort`
pub fn compare_rows(a: &DataRow, b: &DataRow, sort: &SortState) -> Ordering {
    let ord = a.get(&sort.column).total_cmp(b.get(&sort.column));
    match sort.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Search and sort `rows` without pagination
pub fn search_and_sort(rows: &[DataRow], search: &str, sort: Option<&SortState>) -> Vec<DataRow> {
    let mut matched: Vec<DataRow> = rows
        .iter()
        .filter(|row| row_matches(row, search))
        .cloned()
        .collect();
    if let Some(sort) = sort {
        matched.sort_by(|a, b| compare_rows(a, b, sort));
    }
    matched
}

/// The first page of the searched and sorted rows
pub fn view(rows: &[DataRow], search: &str, sort: Option<&SortState>) -> Vec<DataRow> {
    let mut matched = search_and_sort(rows, search, sort);
    matched.truncate(PAGE_SIZE);
    matched
}

pub fn query(rows: &[DataRow], query: &TableQuery) -> TablePage {
    let matched = search_and_sort(rows, &query.search, query.sort.as_ref());
    let page_size = query.page_size.max(1);
    let total = matched.len();
    let page_count = total.div_ceil(page_size).max(1);
    let page = query.page.min(page_count - 1);

    let rows_on_page = matched
        .into_iter()
        .skip(page * page_size)
        .take(page_size)
        .collect();

    debug!(
        "Table query '{}' matched {} rows, page {}/{}",
        query.search,
        total,
        page + 1,
        page_count
    );
    TablePage {
        columns: column_union(rows),
        rows: rows_on_page,
        total,
        page,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{row, DataValue};

    fn people() -> Vec<DataRow> {
        vec![
            row! { "name" => "Ada", "age" => 36 },
            row! { "name" => "bob", "age" => DataValue::Null },
            row! { "name" => "Cy", "age" => 36 },
            row! { "name" => "Dee", "age" => "unknown" },
            row! { "name" => "Eve", "age" => 7 },
        ]
    }

    fn names(rows: &[DataRow]) -> Vec<String> {
        rows.iter().map(|r| r.get("name").to_string()).collect()
    }

    #[test]
    fn test_search_any_field_case_insensitive() {
        let rows = people();
        assert_eq!(names(&view(&rows, "BO", None)), vec!["bob"]);
        assert_eq!(names(&view(&rows, "36", None)), vec!["Ada", "Cy"]);
        assert_eq!(view(&rows, "", None).len(), 5);
    }

    #[test]
    fn test_sort_total_order_is_stable() {
        let rows = people();
        let asc = SortState::new("age", SortDirection::Asc);
        assert_eq!(names(&view(&rows, "", Some(&asc))), vec!["bob", "Eve", "Ada", "Cy", "Dee"]);

        let desc = SortState::new("age", SortDirection::Desc);
        assert_eq!(names(&view(&rows, "", Some(&desc))), vec!["Dee", "Ada", "Cy", "Eve", "bob"]);
    }

    #[test]
    fn test_display_cap_reports_total() {
        let rows: Vec<DataRow> = (0..120).map(|i| row! { "i" => i }).collect();
        let page = query(&rows, &TableQuery::default());
        assert_eq!(page.rows.len(), 50);
        assert_eq!(page.total, 120);
        assert_eq!(page.page_count, 3);
        assert!(page.is_truncated());

        let last = query(
            &rows,
            &TableQuery {
                page: 9,
                ..TableQuery::default()
            },
        );
        assert_eq!(last.page, 2);
        assert_eq!(last.rows.len(), 20);
        assert_eq!(view(&rows, "", None).len(), 50);
    }

    #[test]
    fn test_sort_click_cycle() {
        let first = SortState::click(None, "age");
        assert_eq!(first.direction, SortDirection::Asc);
        let second = SortState::click(Some(&first), "age");
        assert_eq!(second.direction, SortDirection::Desc);
        let other = SortState::click(Some(&second), "name");
        assert_eq!(other, SortState::new("name", SortDirection::Asc));
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let page = query(&[], &TableQuery::default());
        assert_eq!(page.total, 0);
        assert_eq!(page.page_count, 1);
        assert!(page.rows.is_empty());
    }
}
