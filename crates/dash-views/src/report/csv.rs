//! CSV export of a dataset

use dash_core::{header_columns, DataRow};

use crate::export::ExportError;

/// Encode `rows` as CSV.
///
/// The header is the first row's columns; later rows are written against
/// that header, so extra columns are dropped and missing ones left empty.
/// Quoting follows RFC 4180.
pub fn to_csv(rows: &[DataRow]) -> Result<Vec<u8>, ExportError> {
    let columns = header_columns(rows);
    let mut writer = csv::Writer::from_writer(Vec::new());
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| row.get(c).to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{row, DataValue};

    #[test]
    fn test_csv_quotes_and_reads_back() {
        let rows = vec![
            row! { "name" => "Acme, Inc.", "note" => "said \"hi\"", "sales" => 10 },
            row! { "name" => "Line\nBreak", "note" => DataValue::Null, "sales" => 2.5 },
        ];
        let bytes = to_csv(&rows).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("name,note,sales\n"));
        assert!(text.contains("\"Acme, Inc.\""));
        assert!(text.contains("\"said \"\"hi\"\"\""));

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["name", "note", "sales"]);
        let records: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        assert_eq!(records[0], vec!["Acme, Inc.", "said \"hi\"", "10"]);
        assert_eq!(records[1], vec!["Line\nBreak", "", "2.5"]);
    }

    #[test]
    fn test_header_comes_from_first_row() {
        let rows = vec![
            row! { "a" => 1, "b" => 1 },
            row! { "a" => 2 },
            row! { "b" => 4, "c" => 5 },
        ];
        let text = String::from_utf8(to_csv(&rows).unwrap()).unwrap();
        assert_eq!(text, "a,b\n1,1\n2,\n,4\n");
    }

    #[test]
    fn test_empty_dataset() {
        assert!(to_csv(&[]).unwrap().is_empty());
    }
}
