//! CSV extract reader with encoding and delimiter auto-detection.
//!
//! Turns CSV rows into header-keyed [`RawRecord`]s. Typed interpretation of
//! the cells lives in [`fields`], Excel workbooks are read by [`xlsx`]; no
//! dataset-specific logic here.

pub mod fields;
pub mod xlsx;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// One CSV row keyed by column header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// The untouched cell.
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Trimmed cell, `None` when absent or a missing token.
    pub fn get(&self, column: &str) -> Option<&str> {
        fields::present(self.raw(column))
    }

    /// Trimmed text, empty when missing.
    pub fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        fields::parse_date(self.raw(column))
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        fields::parse_int(self.raw(column))
    }

    pub fn float(&self, column: &str) -> Option<f64> {
        fields::parse_float(self.raw(column))
    }

    pub fn flag(&self, column: &str) -> bool {
        fields::parse_bool(self.raw(column))
    }
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows
    pub records: Vec<RawRecord>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Invalid UTF-8 is decoded lossily rather than rejected; a leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
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

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use supplychain::parser::parse_str;
///
/// let rows = parse_str("delivery_id,carrier\nD1,DHL", ',').unwrap();
/// assert_eq!(rows[0].get("carrier"), Some("DHL"));
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Vec<RawRecord>> {
    parse_with_headers(content, delimiter).map(|(_, records)| records)
}

fn parse_with_headers(content: &str, delimiter: char) -> CsvResult<(Vec<String>, Vec<RawRecord>)> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let delimiter = u8::try_from(delimiter).map_err(|_| CsvError::ParseError {
        line: 0,
        message: format!("Unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        // Blank lines are skipped; delimiter-only rows stay as all-missing records.
        if row.len() == 1 && row.get(0).map_or(true, |cell| cell.trim().is_empty()) {
            continue;
        }

        let mut record = RawRecord::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            record.insert(header.clone(), row.get(i).unwrap_or(""));
        }
        records.push(record);
    }

    Ok((headers, records))
}

/// Parse CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let (headers, records) = parse_with_headers(&content, delimiter)?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}
