//! In-memory stand-ins for MySQL, S3 and the clock.

use crate::error::{AppError, AppResult};
use crate::models::{Row, TableName};
use crate::services::clock::Clock;
use crate::services::source::{Selection, SourceConnector, SourceSession};
use crate::services::storage::ObjectStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn minutes_ago(minutes: i64) -> NaiveDateTime {
    (Utc::now() - chrono::Duration::minutes(minutes)).naive_utc()
}

pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2024, 5, 17, 3, 5, 9).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone, Default)]
pub struct FakeTable {
    columns: Vec<String>,
    rows: Vec<Row>,
    fail_fetch: bool,
}

impl FakeTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_fetch = true;
        self
    }
}

#[derive(Default)]
struct FakeState {
    tables: HashMap<String, FakeTable>,
    selections: Vec<(String, Selection)>,
    connects: usize,
    closes: usize,
    refuse_connections: bool,
}

/// A database whose tables live in memory. Selections are evaluated against the real clock.
#[derive(Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, table: FakeTable) -> Self {
        self.state.lock().unwrap().tables.insert(name.to_string(), table);
        self
    }

    pub fn refusing_connections(self) -> Self {
        self.state.lock().unwrap().refuse_connections = true;
        self
    }

    pub fn session(&self) -> FakeSession {
        FakeSession { state: self.state.clone() }
    }

    pub fn selections(&self) -> Vec<(String, Selection)> {
        self.state.lock().unwrap().selections.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

#[async_trait]
impl SourceConnector for FakeSource {
    async fn connect(&self) -> AppResult<Box<dyn SourceSession>> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_connections {
            return Err(AppError::Connection("Can't connect to MySQL server on 'db' (111)".into()));
        }
        state.connects += 1;
        Ok(Box::new(self.session()))
    }
}

pub struct FakeSession {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl SourceSession for FakeSession {
    async fn column_names(&mut self, table: &TableName) -> AppResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(table.as_str())
            .map(|t| t.columns.clone())
            .ok_or_else(|| AppError::Query(format!("Table '{table}' doesn't exist")))
    }

    async fn fetch_rows(&mut self, table: &TableName, selection: &Selection) -> AppResult<Vec<Row>> {
        let mut state = self.state.lock().unwrap();
        state.selections.push((table.to_string(), selection.clone()));

        let fake = state
            .tables
            .get(table.as_str())
            .ok_or_else(|| AppError::Query(format!("Table '{table}' doesn't exist")))?;
        if fake.fail_fetch {
            return Err(AppError::Query("Lost connection to MySQL server during query".into()));
        }

        let rows = match selection {
            Selection::Full => fake.rows.clone(),
            Selection::Since { column, window } => {
                let cutoff = Utc::now() - chrono::Duration::from_std(*window).unwrap();
                fake.rows
                    .iter()
                    .filter(|row| {
                        row.get(column)
                            .and_then(|v| v.as_instant())
                            .is_some_and(|at| at >= cutoff)
                    })
                    .cloned()
                    .collect()
            }
        };
        Ok(rows)
    }

    async fn close(&mut self) -> AppResult<()> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Bucket held in memory. Keys starting with `fail_prefix` are rejected.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<(String, Vec<u8>, String)>>,
    fail_prefix: Option<String>,
}

impl MemoryStore {
    pub fn failing_on(prefix: &str) -> Self {
        Self {
            fail_prefix: Some(prefix.to_string()),
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().iter().map(|(k, _, _)| k.clone()).collect()
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, body, content_type)| (body.clone(), content_type.clone()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> AppResult<()> {
        if let Some(prefix) = &self.fail_prefix {
            if key.starts_with(prefix.as_str()) {
                return Err(AppError::Storage(format!("Access Denied for {key}")));
            }
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), body, content_type.to_string()));
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory://{key}")
    }
}
