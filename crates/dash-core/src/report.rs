//! Saved analysis reports

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::row::DataRow;

/// An analysis together with the dataset it was produced from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub name: String,
    pub date: String,
    pub analysis: AnalysisResult,
    #[serde(default)]
    pub data: Vec<DataRow>,
}

impl Report {
    /// Create a report for a freshly analysed file.
    ///
    /// The report name is the file name without its extension.
    pub fn new(file_name: &str, analysis: AnalysisResult, data: Vec<DataRow>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name: report_name(file_name),
            date: Local::now().format("%Y-%m-%d").to_string(),
            analysis,
            data,
        }
    }

    /// Copy with the dataset truncated to `max_rows`, used for persistence
    pub fn compact(&self, max_rows: usize) -> Self {
        Self {
            data: self.data.iter().take(max_rows).cloned().collect(),
            ..self.clone()
        }
    }
}

/// Strip the final extension: `sales.q1.csv` → `sales.q1`
pub fn report_name(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name[..idx].to_string(),
        _ => file_name.to_string(),
    }
}
