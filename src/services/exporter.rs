use crate::error::AppResult;
use crate::models::manifest::data_object_key;
use crate::models::{ExportRecord, TableName};
use crate::services::clock::Clock;
use crate::services::csv;
use crate::services::source::{Selection, SourceSession};
use crate::services::storage::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Copies the recent rows of one table into one CSV object.
pub struct TableExporter {
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl TableExporter {
    pub fn new(store: Arc<dyn ObjectStore>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self { store, clock, window }
    }

    /// Never fails: any fault is logged and reported as `ExportRecord::Failed`.
    pub async fn export_table(&self, session: &mut dyn SourceSession, table: &TableName) -> ExportRecord {
        match self.try_export(session, table).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to backup table {}: {}", table, e);
                ExportRecord::Failed { error: e.to_string() }
            }
        }
    }

    async fn try_export(&self, session: &mut dyn SourceSession, table: &TableName) -> AppResult<ExportRecord> {
        let columns = session.column_names(table).await?;
        let selection = Selection::for_columns(columns.as_slice(), self.window);
        match selection.column() {
            Some(column) => info!("Incremental backup of {} on {} (last {:?})", table, column, self.window),
            None => info!("Full backup of {}: no updated_at or created_at column", table),
        }

        let rows = session.fetch_rows(table, &selection).await?;
        if rows.is_empty() {
            info!("No new data in table {}", table);
            return Ok(ExportRecord::Empty);
        }

        let body = csv::render(&rows);
        let key = data_object_key(table.as_str(), self.clock.now());

        self.store
            .put_object(&key, body.into_bytes(), mime::TEXT_CSV.as_ref())
            .await?;

        info!("Uploaded {} rows from {} to {}", rows.len(), table, self.store.location(&key));
        Ok(ExportRecord::Written { key, rows: rows.len() })
    }
}
