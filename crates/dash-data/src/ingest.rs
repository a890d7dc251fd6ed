//! Dataset ingestion
//!
//! CSV and JSON files become rows with best-effort typing: numeric-looking
//! strings become numbers, `true`/`false` become booleans and empty strings
//! become null. Rows that cannot be read are skipped, not fatal.

use dash_core::value::parse_finite;
use dash_core::{DataRow, DataValue};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::DataError;

/// Type a raw text cell
pub fn coerce_cell(raw: &str) -> DataValue {
    if raw.is_empty() {
        return DataValue::Null;
    }
    let trimmed = raw.trim();
    if let Some(n) = parse_finite(trimmed) {
        return DataValue::Number(n);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return DataValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return DataValue::Bool(false);
    }
    DataValue::Text(trimmed.to_string())
}

/// Coerce every text cell of `row`; typed cells are kept
fn coerce_row(mut row: DataRow) -> DataRow {
    for (_, value) in row.iter_mut() {
        if let DataValue::Text(s) = value {
            *value = coerce_cell(s);
        }
    }
    row
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRows {
    Many(Vec<DataRow>),
    One(DataRow),
}

/// Parse a JSON array of row objects, or a single object
pub fn parse_json_rows(json: &str) -> Result<Vec<DataRow>, DataError> {
    let rows = match serde_json::from_str::<JsonRows>(json)? {
        JsonRows::Many(rows) => rows,
        JsonRows::One(row) => vec![row],
    };
    Ok(rows
        .into_iter()
        .filter(|row| !row.is_empty())
        .map(coerce_row)
        .collect())
}

/// Parse CSV text with a header row.
///
/// Short records read the missing fields as null, extra fields are dropped
/// and records where every field is empty are skipped.
pub fn parse_csv_rows(text: &str) -> Result<Vec<DataRow>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable CSV record: {}", e);
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let row: DataRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let field = record.get(i).unwrap_or("").trim();
                (header.clone(), coerce_cell(field))
            })
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(DataError::NoDataRows);
    }
    debug!("Parsed {} CSV rows ({} skipped)", rows.len(), skipped);
    Ok(rows)
}

pub fn load_csv_rows(path: &Path) -> Result<Vec<DataRow>, DataError> {
    let text = std::fs::read_to_string(path)?;
    let rows = parse_csv_rows(&text)?;
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_json_rows(path: &Path) -> Result<Vec<DataRow>, DataError> {
    let text = std::fs::read_to_string(path)?;
    let rows = parse_json_rows(&text)?;
    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read a `.csv` or `.json` file, picked by extension
pub fn load_dataset(path: &Path) -> Result<Vec<DataRow>, DataError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => load_csv_rows(path),
        "json" => load_json_rows(path),
        _ => Err(DataError::UnsupportedFormat(extension)),
    }
}

/// Keep `rate` percent of the rows, evenly spaced and in order
pub fn sample_rows(rows: Vec<DataRow>, rate: u8) -> Vec<DataRow> {
    if rate >= 100 || rows.len() <= 1 {
        return rows;
    }
    let total = rows.len();
    let sample_size = total * rate as usize / 100;
    if sample_size == 0 {
        return Vec::new();
    }
    let step = total as f64 / sample_size as f64;
    let mut picked = (0..sample_size)
        .map(|i| (i as f64 * step).floor() as usize)
        .peekable();

    let sampled: Vec<DataRow> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            if picked.peek() == Some(&index) {
                picked.next();
                Some(row)
            } else {
                None
            }
        })
        .collect();
    debug!("Sampled {} of {} rows at {}%", sampled.len(), total, rate);
    sampled
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::row;

    #[test]
    fn test_coerce_cell() {
        assert_eq!(coerce_cell(""), DataValue::Null);
        assert_eq!(coerce_cell(" 42 "), DataValue::Number(42.0));
        assert_eq!(coerce_cell("-1.5e2"), DataValue::Number(-150.0));
        assert_eq!(coerce_cell("TRUE"), DataValue::Bool(true));
        assert_eq!(coerce_cell("false"), DataValue::Bool(false));
        assert_eq!(coerce_cell(" East "), DataValue::from("East"));
        assert_eq!(coerce_cell("NaN"), DataValue::from("NaN"));
    }

    #[test]
    fn test_csv_quoted_fields_and_coercion() {
        let text = "name, sales ,active,note\n\
                    \"Smith, Jane\",1200,true,\"said \"\"hi\"\"\"\n\
                    Bob,,FALSE\n\
                    ,,,\n\
                    Ann,7.5,maybe,\"two\nlines\"\n";
        let rows = parse_csv_rows(text).unwrap();
        assert_eq!(rows.len(), 3);

        let columns: Vec<_> = rows[0].columns().collect();
        assert_eq!(columns, vec!["name", "sales", "active", "note"]);
        assert_eq!(
            rows[0],
            row! {
                "name" => "Smith, Jane",
                "sales" => 1200,
                "active" => true,
                "note" => "said \"hi\"",
            }
        );
        assert!(rows[1].get("sales").is_null());
        assert_eq!(rows[1].get("active"), &DataValue::Bool(false));
        assert!(rows[1].get("note").is_null());
        assert_eq!(rows[2].get("active"), &DataValue::from("maybe"));
        assert_eq!(rows[2].get("note"), &DataValue::from("two\nlines"));
    }

    #[test]
    fn test_csv_needs_a_data_row() {
        assert!(matches!(parse_csv_rows("a,b\n"), Err(DataError::NoDataRows)));
        assert!(matches!(parse_csv_rows("a,b\n,\n"), Err(DataError::NoDataRows)));
    }

    #[test]
    fn test_json_keeps_order_and_coerces_text() {
        let json = r#"[{"b": "7", "a": 1.5, "c": null, "d": "true", "e": ""}]"#;
        let rows = parse_json_rows(json).unwrap();
        let columns: Vec<_> = rows[0].columns().collect();
        assert_eq!(columns, vec!["b", "a", "c", "d", "e"]);
        assert_eq!(rows[0].get("b").as_f64(), Some(7.0));
        assert_eq!(rows[0].get("a").as_f64(), Some(1.5));
        assert!(rows[0].get("c").is_null());
        assert_eq!(rows[0].get("d"), &DataValue::Bool(true));
        assert!(rows[0].get("e").is_null());
    }

    #[test]
    fn test_json_single_object_and_errors() {
        let rows = parse_json_rows(r#"{"region": "East"}"#).unwrap();
        assert_eq!(rows, vec![row! { "region" => "East" }]);
        assert!(parse_json_rows("{}").unwrap().is_empty());
        assert!(matches!(parse_json_rows("[1, 2]"), Err(DataError::Json(_))));
    }

    #[test]
    fn test_load_dataset_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("sales.CSV");
        std::fs::write(&csv_path, "x,y\na,1\n").unwrap();
        assert_eq!(load_dataset(&csv_path).unwrap().len(), 1);

        let txt_path = dir.path().join("notes.txt");
        std::fs::write(&txt_path, "x").unwrap();
        assert!(matches!(
            load_dataset(&txt_path),
            Err(DataError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn test_sampling_is_even_and_ordered() {
        let rows: Vec<DataRow> = (0..10).map(|i| row! { "i" => i }).collect();

        let half = sample_rows(rows.clone(), 50);
        let picked: Vec<_> = half.iter().filter_map(|r| r.get("i").as_f64()).collect();
        assert_eq!(picked, vec![0.0, 2.0, 4.0, 6.0, 8.0]);

        let third = sample_rows(rows.clone(), 30);
        let picked: Vec<_> = third.iter().filter_map(|r| r.get("i").as_f64()).collect();
        assert_eq!(picked, vec![0.0, 3.0, 6.0]);

        assert_eq!(sample_rows(rows.clone(), 100).len(), 10);
        assert!(sample_rows(rows, 5).is_empty());
        assert_eq!(sample_rows(vec![row! { "i" => 1 }], 10).len(), 1);
    }
}
