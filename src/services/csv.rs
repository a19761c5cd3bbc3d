//! Delimited text rendering for table snapshots.
//!
//! Fields are joined with commas and never quoted or escaped, so values
//! containing commas or newlines produce ambiguous output.

use crate::models::{CellValue, Row};
use base64::{engine::general_purpose, Engine as _};

pub const DELIMITER: &str = ",";

/// Header line from the first row's column order, then one line per row.
/// Returns an empty string for an empty result set.
pub fn render(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let headers: Vec<&str> = first.columns().collect();
    let mut buffer = String::new();
    buffer.push_str(&headers.join(DELIMITER));
    buffer.push('\n');

    for row in rows {
        let fields: Vec<String> = headers
            .iter()
            .map(|h| row.get(h).map(render_value).unwrap_or_default())
            .collect();
        buffer.push_str(&fields.join(DELIMITER));
        buffer.push('\n');
    }

    buffer
}

pub fn render_value(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Int(v) => v.to_string(),
        CellValue::UInt(v) => v.to_string(),
        CellValue::Float32(v) => v.to_string(),
        CellValue::Float(v) => v.to_string(),
        CellValue::Text(v) => v.clone(),
        CellValue::Bytes(v) => general_purpose::STANDARD.encode(v),
        CellValue::Date(v) => v.format("%Y-%m-%d").to_string(),
        CellValue::Time(v) => v.to_string(),
        CellValue::DateTime(v) => v.to_string(),
        CellValue::Timestamp(v) => v.naive_utc().to_string(),
    }
}
