//! Table reader - turns billing extracts into raw positional rows.
//!
//! Two sources are supported:
//!
//! - `.xlsx` workbooks via calamine, with a named-sheet-or-first fallback and
//!   a configurable number of leading rows skipped before the header row
//!   (billing extracts carry a report banner above the table).
//! - Delimited text with encoding and delimiter auto-detection.
//!
//! No billing logic lives here; every cell comes out as a [`RawCell`] and the
//! normalizer does the rest.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, Xlsx};

use crate::error::{ReadError, ReadResult};
use crate::models::{RawCell, RawRow};

/// Where a table came from, for logging and API metadata.
#[derive(Debug, Clone)]
pub enum TableOrigin {
    Workbook { sheet: String },
    Delimited { encoding: String, delimiter: char },
}

/// A read table: header row consumed, all-blank rows dropped.
#[derive(Debug)]
pub struct TableData {
    pub rows: Vec<RawRow>,
    pub headers: Vec<String>,
    pub origin: TableOrigin,
}

// =============================================================================
// Workbook Reading
// =============================================================================

/// Read a workbook file.
pub fn read_workbook_file<P: AsRef<Path>>(
    path: P,
    sheet: Option<&str>,
    skip_rows: usize,
) -> ReadResult<TableData> {
    let bytes = std::fs::read(path.as_ref())?;
    read_workbook_bytes(&bytes, sheet, skip_rows)
}

/// Read a workbook from in-memory bytes.
///
/// `skip_rows` leading rows are dropped, then one header row, then data.
pub fn read_workbook_bytes(
    bytes: &[u8],
    sheet: Option<&str>,
    skip_rows: usize,
) -> ReadResult<TableData> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| ReadError::MissingSheet(name.to_string()))?,
        None => sheet_names.first().cloned().ok_or(ReadError::NoSheets)?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows().skip(skip_rows);

    let header_row = rows
        .next()
        .ok_or_else(|| ReadError::EmptySheet(sheet_name.clone()))?;
    let headers: Vec<String> = header_row.iter().map(header_text).collect();

    let data: Vec<RawRow> = rows
        .map(|row| row.iter().map(convert_cell).collect::<RawRow>())
        .filter(|row: &RawRow| !row.iter().all(RawCell::is_blank))
        .collect();

    Ok(TableData {
        rows: data,
        headers,
        origin: TableOrigin::Workbook { sheet: sheet_name },
    })
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::Error(e) => RawCell::Text(format!("{:?}", e)),
        Data::DateTime(dt) => RawCell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => RawCell::Text(s.clone()),
        Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}

fn header_text(cell: &Data) -> String {
    match convert_cell(cell) {
        RawCell::Empty => String::new(),
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(n) => format!("{}", n),
        RawCell::Bool(b) => b.to_string(),
    }
}

// =============================================================================
// Delimited Text Reading
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ReadResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string())),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        _ => {
            // Fallback: UTF-8 with lossy conversion
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read delimited text bytes with encoding and delimiter auto-detection.
///
/// The first line is the header row; short data rows are padded with blank
/// cells up to the header width.
pub fn read_delimited_bytes(bytes: &[u8]) -> ReadResult<TableData> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    let mut lines = content.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| ReadError::EmptySheet("delimited input".to_string()))?;

    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let mut row: RawRow = line
            .split(delimiter)
            .map(|s| {
                let cell = s.trim().trim_matches('"');
                if cell.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(cell.to_string())
                }
            })
            .collect();
        while row.len() < headers.len() {
            row.push(RawCell::Empty);
        }

        rows.push(row);
    }

    Ok(TableData {
        rows,
        headers,
        origin: TableOrigin::Delimited {
            encoding,
            delimiter,
        },
    })
}

// =============================================================================
// Format Dispatch
// =============================================================================

/// True when the bytes look like a zip container (xlsx).
pub fn looks_like_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK")
}

/// Read either format, sniffing by magic bytes.
pub fn read_table_bytes(
    bytes: &[u8],
    sheet: Option<&str>,
    skip_rows: usize,
) -> ReadResult<TableData> {
    if looks_like_workbook(bytes) {
        read_workbook_bytes(bytes, sheet, skip_rows)
    } else {
        read_delimited_bytes(bytes)
    }
}
