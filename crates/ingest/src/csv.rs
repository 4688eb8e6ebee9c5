//! Forgiving CSV stream parsing.
//!
//! Real exports contain short rows, long rows, and stray quotes. The parser
//! is a best-effort producer of records, not a validator: mismatched column
//! counts are padded or truncated with a warning, rows that fail outright
//! are skipped with a warning, and parsing always continues.

use serde::Serialize;

use crate::encoding::{detect_and_decode, SourceEncoding};
use crate::error::IngestError;

/// Leading/trailing characters removed from every header and field.
const ASCII_WHITESPACE: &[char] = &[' ', '\t', '\r', '\n'];

/// Non-fatal issue encountered while parsing a CSV stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub row: usize,
    pub message: String,
}

/// A single data row. `values` always has exactly one entry per header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    /// 1-indexed data-row number; the header is row 0. Rows skipped with a
    /// warning still consume their number, leaving a gap here.
    pub row_number: usize,
    pub values: Vec<String>,
}

/// Parsed CSV stream: shared header vector plus padded/truncated rows.
#[derive(Debug)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<DataRow>,
    pub warnings: Vec<ParseWarning>,
    pub encoding: SourceEncoding,
}

/// Parse raw CSV bytes into rows sharing a header vector.
///
/// The input is decoded first (see [`detect_and_decode`]). Quoting is lazy:
/// a bare `"` inside an unquoted field is literal. Fields and headers are
/// trimmed of leading/trailing ASCII whitespace.
pub fn parse(data: &[u8]) -> Result<ParsedCsv, IngestError> {
    let (text, encoding) = detect_and_decode(data)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        None => return Err(IngestError::EmptyFile),
        Some(Err(e)) => return Err(IngestError::HeaderRead(e.to_string())),
        Some(Ok(record)) => record.iter().map(trim_field).collect(),
    };
    let header_count = headers.len();

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut row_number = 0usize;

    for result in records {
        row_number += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warnings.push(ParseWarning {
                    row: row_number,
                    message: format!("parse error: {e}"),
                });
                continue;
            }
        };

        let mut values: Vec<String> = record.iter().map(trim_field).collect();

        if values.len() < header_count {
            warnings.push(ParseWarning {
                row: row_number,
                message: format!(
                    "row {row_number} has {} columns, expected {header_count}; padding with empty values",
                    values.len(),
                ),
            });
            values.resize(header_count, String::new());
        } else if values.len() > header_count {
            warnings.push(ParseWarning {
                row: row_number,
                message: format!(
                    "row {row_number} has {} columns, expected {header_count}; truncating extra columns",
                    values.len(),
                ),
            });
            values.truncate(header_count);
        }

        rows.push(DataRow { row_number, values });
    }

    if rows.is_empty() {
        return Err(IngestError::NoDataRows);
    }

    Ok(ParsedCsv {
        headers,
        rows,
        warnings,
        encoding,
    })
}

fn trim_field(field: &str) -> String {
    field.trim_matches(ASCII_WHITESPACE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_parse() {
        let parsed = parse(b"email,name\na@x.com,Alice\nb@x.com,Bob\n").unwrap();
        assert_eq!(parsed.headers, vec!["email", "name"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].values, vec!["a@x.com", "Alice"]);
        assert_eq!(parsed.rows[0].row_number, 1);
        assert_eq!(parsed.rows[1].row_number, 2);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.encoding, SourceEncoding::Utf8);
    }

    #[test]
    fn headers_and_fields_are_trimmed() {
        let parsed = parse(b" email , name \n a@x.com ,\tAlice \n").unwrap();
        assert_eq!(parsed.headers, vec!["email", "name"]);
        assert_eq!(parsed.rows[0].values, vec!["a@x.com", "Alice"]);
    }

    #[test]
    fn short_row_is_padded_with_warning() {
        let parsed = parse(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(parsed.rows[0].values, vec!["1", "2", ""]);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].row, 1);
        assert_eq!(
            parsed.warnings[0].message,
            "row 1 has 2 columns, expected 3; padding with empty values",
        );
    }

    #[test]
    fn long_row_is_truncated_with_warning() {
        let parsed = parse(b"a,b\n1,2,3,4\n").unwrap();
        assert_eq!(parsed.rows[0].values, vec!["1", "2"]);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(
            parsed.warnings[0].message,
            "row 1 has 4 columns, expected 2; truncating extra columns",
        );
    }

    #[test]
    fn quoted_comma_is_preserved() {
        let parsed = parse(b"name,dept\n\"Smith, John\",Sales\n").unwrap();
        assert_eq!(parsed.rows[0].values, vec!["Smith, John", "Sales"]);
    }

    #[test]
    fn bare_quote_in_unquoted_field_is_literal() {
        let parsed = parse(b"a,b\nsays \"hi\",2\n").unwrap();
        assert_eq!(parsed.rows[0].values[0], "says \"hi\"");
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = parse(b"a,b\r\n1,2\r\n").unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].values, vec!["1", "2"]);
    }

    #[test]
    fn empty_input_is_empty_file() {
        let err = parse(b"").unwrap_err();
        assert!(matches!(err, IngestError::EmptyFile));
        assert_eq!(err.to_string(), "empty file: no header row found");
    }

    #[test]
    fn header_only_is_no_data_rows() {
        let err = parse(b"email,name\n").unwrap_err();
        assert!(matches!(err, IngestError::NoDataRows));
        assert_eq!(err.to_string(), "file contains no data rows");
    }

    #[test]
    fn blank_lines_are_skipped_by_the_reader() {
        let parsed = parse(b"a,b\n\n1,2\n").unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn utf16le_input_decodes_before_parsing() {
        let mut data = vec![0xFF, 0xFE];
        for unit in "email\r\na@x.com\r\n".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let parsed = parse(&data).unwrap();
        assert_eq!(parsed.headers, vec!["email"]);
        assert_eq!(parsed.rows[0].values, vec!["a@x.com"]);
        assert_eq!(parsed.encoding, SourceEncoding::Utf16Le);
    }

    #[test]
    fn row_count_is_conservative() {
        // 3 data rows in, 3 accounted for: 2 parsed clean, 1 padded.
        let parsed = parse(b"a,b\n1,2\nonly\n3,4\n").unwrap();
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.warnings.len(), 1);
    }
}
