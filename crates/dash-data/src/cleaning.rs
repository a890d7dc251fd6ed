//! Dataset cleaning
//!
//! The pipeline always runs its steps in the same order, whichever options
//! are enabled: trim text, handle missing values, then drop duplicates.

use ahash::{AHashMap, AHashSet};
use dash_core::{column_union, DataRow, DataValue, ReanalysisSink};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What to do with null or empty cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    #[default]
    None,
    /// Remove every row with at least one missing cell
    Drop,
    /// Fill with the column mean, numeric columns only
    ImputeMean,
    /// Fill with `0`
    ImputeZero,
}

impl MissingStrategy {
    pub const ALL: [MissingStrategy; 4] = [
        MissingStrategy::None,
        MissingStrategy::Drop,
        MissingStrategy::ImputeMean,
        MissingStrategy::ImputeZero,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MissingStrategy::None => "Keep as is",
            MissingStrategy::Drop => "Drop rows",
            MissingStrategy::ImputeMean => "Fill with mean",
            MissingStrategy::ImputeZero => "Fill with zero",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CleaningOptions {
    pub handle_missing: MissingStrategy,
    pub remove_duplicates: bool,
    pub standardize_text: bool,
    /// Let `impute_zero` write `0` into text columns as well
    pub zero_fill_text: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            handle_missing: MissingStrategy::None,
            remove_duplicates: false,
            standardize_text: false,
            zero_fill_text: true,
        }
    }
}

/// Run the cleaning pipeline over `rows`, returning a new dataset
pub fn apply(rows: &[DataRow], options: &CleaningOptions) -> Vec<DataRow> {
    let mut cleaned = rows.to_vec();

    if options.standardize_text {
        cleaned = standardize_text(cleaned);
    }

    cleaned = match options.handle_missing {
        MissingStrategy::None => cleaned,
        MissingStrategy::Drop => drop_missing(cleaned),
        MissingStrategy::ImputeMean => impute_mean(cleaned, &column_means(rows)),
        MissingStrategy::ImputeZero => impute_zero(cleaned, options.zero_fill_text),
    };

    if options.remove_duplicates {
        cleaned = remove_duplicates(&cleaned);
    }

    debug!(
        "Cleaned {} rows into {} ({:?})",
        rows.len(),
        cleaned.len(),
        options
    );
    cleaned
}

/// Clean `rows` and hand the result to the re-analysis collaborator.
///
/// Returns as soon as the dataset has been dispatched.
pub fn run(
    rows: &[DataRow],
    options: &CleaningOptions,
    file_name: &str,
    sink: &dyn ReanalysisSink,
) -> CleaningOutcome {
    let cleaned = apply(rows, options);
    let outcome = CleaningOutcome {
        rows_before: rows.len(),
        rows_after: cleaned.len(),
    };
    info!(
        "Dispatching cleaned dataset '{}' for re-analysis ({} → {} rows)",
        file_name, outcome.rows_before, outcome.rows_after
    );
    sink.request_reanalysis(cleaned, file_name);
    outcome
}

fn standardize_text(mut rows: Vec<DataRow>) -> Vec<DataRow> {
    for row in &mut rows {
        for (_, value) in row.iter_mut() {
            if let DataValue::Text(s) = value {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
        }
    }
    rows
}

fn drop_missing(rows: Vec<DataRow>) -> Vec<DataRow> {
    let columns = column_union(&rows);
    rows.into_iter()
        .filter(|row| columns.iter().all(|c| !row.get(c).is_missing()))
        .collect()
}

/// Mean of the stored numbers in each column that has at least one
fn column_means(rows: &[DataRow]) -> AHashMap<String, f64> {
    let mut sums: AHashMap<String, (f64, usize)> = AHashMap::new();
    for row in rows {
        for (column, value) in row.iter() {
            if let Some(n) = value.as_f64() {
                let entry = sums.entry(column.to_string()).or_insert((0.0, 0));
                entry.0 += n;
                entry.1 += 1;
            }
        }
    }
    sums.into_iter()
        .map(|(column, (sum, count))| (column, sum / count as f64))
        .collect()
}

fn impute_mean(mut rows: Vec<DataRow>, means: &AHashMap<String, f64>) -> Vec<DataRow> {
    let columns = column_union(&rows);
    for row in &mut rows {
        for column in &columns {
            if let Some(mean) = means.get(column) {
                if row.get(column).is_missing() {
                    row.insert(column.as_str(), *mean);
                }
            }
        }
    }
    rows
}

fn impute_zero(mut rows: Vec<DataRow>, zero_fill_text: bool) -> Vec<DataRow> {
    let columns: Vec<String> = column_union(&rows)
        .into_iter()
        .filter(|c| zero_fill_text || !is_text_column(&rows, c))
        .collect();
    for row in &mut rows {
        for column in &columns {
            if row.get(column).is_missing() {
                row.insert(column.as_str(), 0.0);
            }
        }
    }
    rows
}

/// A column holding text but no numbers
fn is_text_column(rows: &[DataRow], column: &str) -> bool {
    let mut has_text = false;
    for row in rows {
        match row.get(column) {
            DataValue::Number(_) => return false,
            DataValue::Text(s) if !s.is_empty() => has_text = true,
            _ => {}
        }
    }
    has_text
}

/// Keep the first occurrence of each structurally distinct row
pub fn remove_duplicates(rows: &[DataRow]) -> Vec<DataRow> {
    let mut seen = AHashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(row.signature()))
        .cloned()
        .collect()
}

/// Before/after row counts of a cleaning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningOutcome {
    pub rows_before: usize,
    pub rows_after: usize,
}

impl CleaningOutcome {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Data quality summary shown before cleaning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningDiagnostics {
    pub total_rows: usize,
    pub missing_cells: usize,
    pub rows_with_missing: usize,
    pub duplicate_rows: usize,
    pub untrimmed_cells: usize,
}

impl CleaningDiagnostics {
    pub fn inspect(rows: &[DataRow]) -> Self {
        let columns = column_union(rows);
        let mut diagnostics = Self {
            total_rows: rows.len(),
            duplicate_rows: rows.len() - remove_duplicates(rows).len(),
            ..Self::default()
        };

        for row in rows {
            let missing = columns.iter().filter(|c| row.get(c).is_missing()).count();
            diagnostics.missing_cells += missing;
            if missing > 0 {
                diagnostics.rows_with_missing += 1;
            }
            diagnostics.untrimmed_cells += row
                .values()
                .filter(|v| matches!(v, DataValue::Text(s) if s.trim().len() != s.len()))
                .count();
        }
        diagnostics
    }

    pub fn is_clean(&self) -> bool {
        self.missing_cells == 0 && self.duplicate_rows == 0 && self.untrimmed_cells == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::row;
    use proptest::prelude::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(usize, String)>>,
    }

    impl ReanalysisSink for Recorder {
        fn request_reanalysis(&self, rows: Vec<DataRow>, file_name: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((rows.len(), file_name.to_string()));
        }
    }

    fn opts(handle_missing: MissingStrategy) -> CleaningOptions {
        CleaningOptions {
            handle_missing,
            ..CleaningOptions::default()
        }
    }

    #[test]
    fn test_impute_zero() {
        let rows = vec![
            row! { "x" => 1 },
            row! { "x" => DataValue::Null },
            row! { "x" => 3 },
        ];
        let out = apply(&rows, &opts(MissingStrategy::ImputeZero));
        assert_eq!(out, vec![row! { "x" => 1 }, row! { "x" => 0 }, row! { "x" => 3 }]);
        assert!(rows[1].get("x").is_null());
    }

    #[test]
    fn test_impute_zero_text_columns() {
        let rows = vec![
            row! { "name" => "a", "n" => 1 },
            row! { "name" => "", "n" => DataValue::Null },
        ];

        let literal = apply(&rows, &opts(MissingStrategy::ImputeZero));
        assert_eq!(literal[1].get("name"), &DataValue::from(0));

        let numeric_only = apply(
            &rows,
            &CleaningOptions {
                zero_fill_text: false,
                ..opts(MissingStrategy::ImputeZero)
            },
        );
        assert_eq!(numeric_only[1].get("name"), &DataValue::from(""));
        assert_eq!(numeric_only[1].get("n"), &DataValue::from(0));
    }

    #[test]
    fn test_impute_mean_numeric_columns_only() {
        let rows = vec![
            row! { "v" => 2, "label" => "a" },
            row! { "v" => DataValue::Null, "label" => DataValue::Null },
            row! { "v" => 4, "label" => "b" },
        ];
        let out = apply(&rows, &opts(MissingStrategy::ImputeMean));
        assert_eq!(out[1].get("v"), &DataValue::from(3.0));
        assert!(out[1].get("label").is_null());
    }

    #[test]
    fn test_drop_checks_every_column() {
        let rows = vec![
            row! { "a" => 1, "b" => "x" },
            row! { "a" => 2, "b" => "" },
            row! { "a" => 3 },
            row! { "a" => DataValue::Null, "b" => "y" },
        ];
        let out = apply(&rows, &opts(MissingStrategy::Drop));
        assert_eq!(out, vec![rows[0].clone()]);
    }

    #[test]
    fn test_duplicates_keep_first() {
        let rows = vec![
            row! { "a" => 1, "b" => "x" },
            row! { "a" => 2, "b" => "y" },
            row! { "a" => 1, "b" => "x" },
        ];
        let options = CleaningOptions {
            remove_duplicates: true,
            ..CleaningOptions::default()
        };
        let out = apply(&rows, &options);
        assert_eq!(out, vec![rows[0].clone(), rows[1].clone()]);
    }

    #[test]
    fn test_trim_runs_before_dedup() {
        let rows = vec![row! { "city" => " Oslo" }, row! { "city" => "Oslo " }];
        let options = CleaningOptions {
            standardize_text: true,
            remove_duplicates: true,
            ..CleaningOptions::default()
        };
        assert_eq!(apply(&rows, &options), vec![row! { "city" => "Oslo" }]);
    }

    #[test]
    fn test_run_dispatches_cleaned_rows() {
        let rows = vec![row! { "a" => 1 }, row! { "a" => 1 }, row! { "a" => DataValue::Null }];
        let options = CleaningOptions {
            handle_missing: MissingStrategy::Drop,
            remove_duplicates: true,
            ..CleaningOptions::default()
        };
        let sink = Recorder::default();
        let outcome = run(&rows, &options, "sales.csv", &sink);

        assert_eq!(outcome.rows_before, 3);
        assert_eq!(outcome.rows_after, 1);
        assert_eq!(outcome.rows_removed(), 2);
        assert_eq!(*sink.calls.lock().unwrap(), vec![(1, "sales.csv".to_string())]);
    }

    #[test]
    fn test_diagnostics() {
        let rows = vec![
            row! { "a" => 1, "b" => " x" },
            row! { "a" => 1, "b" => " x" },
            row! { "a" => DataValue::Null },
        ];
        let d = CleaningDiagnostics::inspect(&rows);
        assert_eq!(d.total_rows, 3);
        assert_eq!(d.missing_cells, 2);
        assert_eq!(d.rows_with_missing, 1);
        assert_eq!(d.duplicate_rows, 1);
        assert_eq!(d.untrimmed_cells, 2);
        assert!(!d.is_clean());
    }

    proptest! {
        #[test]
        fn prop_dedup_is_idempotent(values in proptest::collection::vec((0i32..3, "[xy]"), 0..20)) {
            let rows: Vec<DataRow> = values
                .into_iter()
                .map(|(a, b)| row! { "a" => a, "b" => b })
                .collect();
            let once = remove_duplicates(&rows);
            prop_assert_eq!(remove_duplicates(&once), once);
        }
    }
}
