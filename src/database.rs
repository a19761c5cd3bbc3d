use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CellValue, Row, TableName};
use crate::services::source::{Selection, SourceConnector, SourceSession};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row as SqlxRow, TypeInfo, ValueRef};
use std::time::Duration;

const COLUMN_NAMES_SQL: &str = r#"
    SELECT CAST(COLUMN_NAME AS CHAR) AS column_name
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

pub struct MySqlConnector {
    options: MySqlConnectOptions,
    connect_timeout: Duration,
    endpoint: String,
}

impl MySqlConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4")
            // `None` skips sqlx's `SET time_zone='+00:00'`, so `NOW()` runs in the server zone.
            .timezone(config.time_zone.clone());

        Self {
            options,
            connect_timeout: config.connect_timeout,
            endpoint: format!("{}:{}/{}", config.host, config.port, config.database),
        }
    }
}

#[async_trait]
impl SourceConnector for MySqlConnector {
    async fn connect(&self) -> AppResult<Box<dyn SourceSession>> {
        tracing::debug!("Connecting to MySQL at {}", self.endpoint);

        let conn = tokio::time::timeout(self.connect_timeout, self.options.connect())
            .await
            .map_err(|_| {
                AppError::Connection(format!(
                    "Timed out after {:?} connecting to {}",
                    self.connect_timeout, self.endpoint
                ))
            })?
            .map_err(|e| AppError::Connection(format!("Failed to connect to {}: {e}", self.endpoint)))?;

        tracing::info!("Successfully connected to {}", self.endpoint);
        Ok(Box::new(MySqlSession { conn: Some(conn) }))
    }
}

pub struct MySqlSession {
    conn: Option<MySqlConnection>,
}

impl MySqlSession {
    fn conn(&mut self) -> AppResult<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| AppError::Connection("Connection already closed".to_string()))
    }
}

#[async_trait]
impl SourceSession for MySqlSession {
    async fn column_names(&mut self, table: &TableName) -> AppResult<Vec<String>> {
        let rows = sqlx::query(COLUMN_NAMES_SQL)
            .bind(table.as_str())
            .fetch_all(self.conn()?)
            .await
            .map_err(|e| AppError::Query(format!("Failed to describe {table}: {e}")))?;

        let columns = rows
            .iter()
            .map(|row| row.try_get::<String, _>("column_name"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Query(format!("Failed to read columns of {table}: {e}")))?;

        if columns.is_empty() {
            return Err(AppError::Query(format!("Table {table} does not exist")));
        }
        Ok(columns)
    }

    async fn fetch_rows(&mut self, table: &TableName, selection: &Selection) -> AppResult<Vec<Row>> {
        let sql = selection.to_sql(table);
        let mut query = sqlx::query(&sql);
        if let Some(secs) = selection.window_secs() {
            query = query.bind(secs);
        }

        let rows = query
            .fetch_all(self.conn()?)
            .await
            .map_err(|e| AppError::Query(format!("Failed to select from {table}: {e}")))?;

        rows.iter().map(decode_row).collect()
    }

    async fn close(&mut self) -> AppResult<()> {
        match self.conn.take() {
            Some(conn) => conn
                .close()
                .await
                .map_err(|e| AppError::Connection(format!("Failed to close connection: {e}"))),
            None => Ok(()),
        }
    }
}

fn decode_row(row: &MySqlRow) -> AppResult<Row> {
    let mut decoded = Row::new();

    for column in row.columns() {
        let idx = column.ordinal();
        let name = column.name();
        let type_name = column.type_info().name();

        let is_null = row
            .try_get_raw(idx)
            .map(|raw| raw.is_null())
            .map_err(|e| AppError::Serialization(format!("column {name}: {e}")))?;

        let value = if is_null {
            CellValue::Null
        } else {
            decode_cell(row, idx, type_name)
                .map_err(|e| AppError::Serialization(format!("column {name} ({type_name}): {e}")))?
        };
        decoded.push(name, value);
    }

    Ok(decoded)
}

/// How a column's values are read, chosen from the MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellDecoder {
    Signed,
    Unsigned,
    Float32,
    Float64,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    Text,
}

impl CellDecoder {
    fn for_type(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => CellDecoder::Signed,
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" | "YEAR" => CellDecoder::Unsigned,
            "FLOAT" => CellDecoder::Float32,
            "DOUBLE" => CellDecoder::Float64,
            "DATE" => CellDecoder::Date,
            "TIME" => CellDecoder::Time,
            "DATETIME" => CellDecoder::DateTime,
            "TIMESTAMP" => CellDecoder::Timestamp,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => CellDecoder::Binary,
            // DECIMAL, character types, ENUM, SET, JSON
            _ => CellDecoder::Text,
        }
    }

    /// Literal for MySQL's all-zero date values, which chrono cannot represent.
    fn zero_literal(self) -> Option<&'static str> {
        match self {
            CellDecoder::Date => Some("0000-00-00"),
            CellDecoder::DateTime | CellDecoder::Timestamp => Some("0000-00-00 00:00:00"),
            _ => None,
        }
    }
}

/// Binary-protocol temporal values are all-zero (or empty) for `0000-00-00`.
fn is_zero_temporal(raw: &[u8]) -> bool {
    raw.iter().all(|b| *b == 0)
}

fn decode_cell(row: &MySqlRow, idx: usize, type_name: &str) -> Result<CellValue, sqlx::Error> {
    let decoder = CellDecoder::for_type(type_name);
    let value = match decoder {
        CellDecoder::Signed => CellValue::Int(row.try_get_unchecked::<i64, _>(idx)?),
        CellDecoder::Unsigned => CellValue::UInt(row.try_get_unchecked::<u64, _>(idx)?),
        CellDecoder::Float32 => CellValue::Float32(row.try_get::<f32, _>(idx)?),
        CellDecoder::Float64 => CellValue::Float(row.try_get::<f64, _>(idx)?),
        CellDecoder::Time => match row.try_get::<NaiveTime, _>(idx) {
            Ok(time) => CellValue::Time(time),
            // Durations beyond 24h or below zero, e.g. `-12:30:00` or `100:00:00`.
            Err(_) => CellValue::Text(row.try_get::<MySqlTime, _>(idx)?.to_string()),
        },
        CellDecoder::Date | CellDecoder::DateTime | CellDecoder::Timestamp => {
            let typed = match decoder {
                CellDecoder::Date => row.try_get::<NaiveDate, _>(idx).map(CellValue::Date),
                CellDecoder::DateTime => row.try_get::<NaiveDateTime, _>(idx).map(CellValue::DateTime),
                _ => row.try_get::<DateTime<Utc>, _>(idx).map(CellValue::Timestamp),
            };
            match typed {
                Ok(value) => value,
                Err(e) => {
                    let raw = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                    match decoder.zero_literal() {
                        Some(zero) if is_zero_temporal(&raw) => CellValue::Text(zero.to_string()),
                        _ => return Err(e),
                    }
                }
            }
        }
        CellDecoder::Binary => CellValue::Bytes(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        CellDecoder::Text => CellValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}
