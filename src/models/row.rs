use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// One cell as read from the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    UInt(u64),
    /// Single-precision `FLOAT`, kept narrow so it renders without widening noise.
    Float32(f32),
    Float(f64),
    /// Decimals and other values already rendered by the server.
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    /// Instant represented by a temporal cell, reading naive values as UTC.
    #[cfg(test)]
    pub fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Timestamp(ts) => Some(*ts),
            CellValue::DateTime(dt) => Some(dt.and_utc()),
            CellValue::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            _ => None,
        }
    }
}

/// Column name to value mapping for one result row, in result-set column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, CellValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, column: &str, value: CellValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: &str, value: CellValue) {
        self.cells.push((column.to_string(), value));
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}
