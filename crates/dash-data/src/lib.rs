//! Dataset transforms for the insight dashboard
//!
//! Everything here is a pure function of its inputs: filters, windows,
//! cleaning and table queries all return new rows (or a borrowed sub-slice)
//! and never touch the source dataset. Ingestion and the report store are
//! the only modules that touch the filesystem.

pub mod analysis;
pub mod cleaning;
pub mod filter;
pub mod ingest;
pub mod profile;
pub mod store;
pub mod table;
pub mod window;

use thiserror::Error;

// Re-exports
pub use analysis::LocalAnalysisService;
pub use cleaning::{CleaningDiagnostics, CleaningOptions, CleaningOutcome, MissingStrategy};
pub use filter::{FilterOperator, FilterRule, FilterSet};
pub use ingest::{
    coerce_cell, load_csv_rows, load_dataset, load_json_rows, parse_csv_rows, parse_json_rows,
    sample_rows,
};
pub use profile::{profile_columns, ColumnKind, ColumnProfile, NumericSummary};
pub use store::{add_report, delete_report, ReportStore, StoreError, StoreStatus};
pub use table::{SortDirection, SortState, TablePage, TableQuery};
pub use window::{window, WindowInfo, DISPLAY_LIMIT};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV must contain a header and at least one data row")]
    NoDataRows,

    #[error("Unsupported file type '{0}'")]
    UnsupportedFormat(String),

    #[error("Report store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unknown filter operator '{0}'")]
    UnknownOperator(String),
}
