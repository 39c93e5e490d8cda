//! Excel workbook reader.
//!
//! Reads the first worksheet of an `.xlsx` file into the same header-keyed
//! [`RawRecord`]s the CSV reader produces, so the cleaners don't care where a
//! row came from.

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;

use super::RawRecord;
use crate::error::{CsvError, CsvResult};

/// Result of reading a worksheet.
#[derive(Debug, Clone)]
pub struct SheetResult {
    /// Name of the worksheet that was read
    pub sheet: String,
    /// Column headers (first row)
    pub headers: Vec<String>,
    /// Data rows
    pub records: Vec<RawRecord>,
}

/// Read the first worksheet of an `.xlsx` workbook.
pub fn parse_xlsx_bytes(bytes: &[u8]) -> CsvResult<SheetResult> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| CsvError::Workbook(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(CsvError::EmptyFile)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| CsvError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|cell| cell_text(cell).trim().to_string()).collect(),
        None => return Err(CsvError::EmptyFile),
    };
    if headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut records = Vec::new();
    for row in rows {
        // Fully empty rows are padding, not data.
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let mut record = RawRecord::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = row.get(i).map(cell_text).unwrap_or_default();
            record.insert(header.clone(), value.trim());
        }
        records.push(record);
    }

    Ok(SheetResult {
        sheet,
        headers,
        records,
    })
}

/// Render a cell the way it would appear in a CSV export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time() == chrono::NaiveTime::MIN => ts.format("%Y-%m-%d").to_string(),
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
    }
}
