//! Tabular input loading with encoding and delimiter auto-detection.
//!
//! Converts CSV rows or workbook rows into JSON objects keyed by header.
//! Cells stay untyped here (strings from CSV; strings, numbers, booleans or
//! null from workbooks). Typing happens in [`crate::clean`].

use calamine::{open_workbook_auto, Data, Reader};
use chrono::Timelike;
use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::error::{DataFormatError, DataResult};

/// Where the raw table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Workbook,
    /// Generated in memory (see [`crate::sample`]).
    Sample,
}

/// Result of parsing with metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Parsed records as JSON objects
    pub records: Vec<Value>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter (CSV only)
    pub delimiter: char,
    /// Column headers, in source order
    pub headers: Vec<String>,
    pub format: SourceFormat,
    /// Sheet read from a workbook
    pub sheet: Option<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> DataResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "utf-8-sig" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).to_string(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        other => {
            let codec = encoding_rs::Encoding::for_label(other.as_bytes()).ok_or_else(|| {
                DataFormatError::Encoding(format!("unsupported encoding '{}'", other))
            })?;
            codec.decode(bytes).0.to_string()
        }
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
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

/// Parse CSV text into JSON objects with an explicit delimiter.
///
/// Each row becomes a JSON object where keys are column headers.
///
/// # Example
/// ```ignore
/// use sales_analytics::parser::csv_to_json;
///
/// let csv = "date;amount\n2024-01-05;10\n2024-01-06;12";
/// let rows = csv_to_json(csv, ';').unwrap();
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0]["amount"], "10");
/// ```
pub fn csv_to_json(csv: &str, delimiter: char) -> DataResult<Vec<Value>> {
    Ok(parse_string_with_metadata(csv, delimiter, "utf-8".to_string())?.records)
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> DataResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> DataResult<ParseResult> {
    if bytes.is_empty() {
        return Err(DataFormatError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> DataResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(DataFormatError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter).map_err(|_| {
        DataFormatError::UnsupportedFormat(format!("non-ASCII delimiter '{}'", delimiter))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = normalize_headers(reader.headers()?.iter().map(str::to_string).collect());
    if headers.iter().all(|h| h.starts_with("column_")) {
        return Err(DataFormatError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            // Short rows are padded, extra cells ignored
            let raw_value = row.get(i).unwrap_or("");
            obj.insert(header.clone(), Value::String(raw_value.to_string()));
        }
        records.push(Value::Object(obj));
    }

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
        format: SourceFormat::Csv,
        sheet: None,
    })
}

/// Read one sheet of a workbook (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`).
///
/// Uses `sheet` when given, otherwise the first sheet. The first non-empty
/// row is the header row.
pub fn parse_workbook<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> DataResult<ParseResult> {
    let mut workbook = open_workbook_auto(path.as_ref())
        .map_err(|e| DataFormatError::Workbook(e.to_string()))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DataFormatError::Workbook("workbook has no sheets".into()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DataFormatError::Workbook(format!("sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range
        .rows()
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)));

    let header_row = rows.next().ok_or(DataFormatError::EmptyFile)?;
    let headers = normalize_headers(
        header_row
            .iter()
            .map(|cell| match cell {
                Data::String(s) => s.trim().to_string(),
                Data::Empty => String::new(),
                other => other.to_string(),
            })
            .collect(),
    );

    let records = rows
        .map(|row| {
            let mut obj = Map::new();
            for (i, header) in headers.iter().enumerate() {
                let value = row.get(i).map(cell_to_value).unwrap_or(Value::Null);
                obj.insert(header.clone(), value);
            }
            Value::Object(obj)
        })
        .collect();

    Ok(ParseResult {
        records,
        encoding: "binary".to_string(),
        delimiter: ',',
        headers,
        format: SourceFormat::Workbook,
        sheet: Some(sheet_name),
    })
}

/// Load any supported file, dispatching on its extension.
pub fn load_table<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> DataResult<ParseResult> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" | "tsv" | "txt" => parse_csv_file_auto(path),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => parse_workbook(path, sheet),
        _ => Err(DataFormatError::UnsupportedFormat(format!(
            "{} (expected .csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb or .ods)",
            path.display()
        ))),
    }
}

/// Blank headers get a positional name; repeated headers get a suffix so
/// no column is silently overwritten.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(raw.len());
    for (i, header) in raw.into_iter().enumerate() {
        let mut name = if header.trim().is_empty() {
            format!("column_{}", i + 1)
        } else {
            header.trim().to_string()
        };
        if headers.contains(&name) {
            name = format!("{}_{}", name, i + 1);
        }
        headers.push(name);
    }
    headers
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.trim().to_string()),
        Data::Int(i) => Value::Number((*i).into()),
        Data::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.num_seconds_from_midnight() == 0 => {
                Value::String(ts.format("%Y-%m-%d").to_string())
            }
            Some(ts) => Value::String(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Number::from_f64(dt.as_f64()).map(Value::Number).unwrap_or(Value::Null),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}
