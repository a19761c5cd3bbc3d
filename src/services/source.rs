use crate::error::AppResult;
use crate::models::table::quote_identifier;
use crate::models::{Row, TableName};
use async_trait::async_trait;
use std::time::Duration;

pub const UPDATED_AT: &str = "updated_at";
pub const CREATED_AT: &str = "created_at";

/// Which rows of a table a run copies.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Rows whose `column` lies within `window` of the database's current time.
    Since { column: &'static str, window: Duration },
    /// Whole table.
    Full,
}

impl Selection {
    /// `updated_at` wins over `created_at`; a table with neither is copied in full.
    pub fn for_columns<S: AsRef<str>>(columns: &[S], window: Duration) -> Self {
        let has = |wanted: &str| columns.iter().any(|c| c.as_ref() == wanted);

        if has(UPDATED_AT) {
            Selection::Since { column: UPDATED_AT, window }
        } else if has(CREATED_AT) {
            Selection::Since { column: CREATED_AT, window }
        } else {
            Selection::Full
        }
    }

    pub fn column(&self) -> Option<&'static str> {
        match self {
            Selection::Since { column, .. } => Some(column),
            Selection::Full => None,
        }
    }

    /// MySQL statement for this selection. The window is left as a `?` placeholder.
    pub fn to_sql(&self, table: &TableName) -> String {
        match self {
            Selection::Since { column, .. } => format!(
                "SELECT * FROM {} WHERE {} >= DATE_SUB(NOW(), INTERVAL ? SECOND)",
                table.quoted(),
                quote_identifier(column)
            ),
            Selection::Full => format!("SELECT * FROM {}", table.quoted()),
        }
    }

    pub fn window_secs(&self) -> Option<u64> {
        match self {
            Selection::Since { window, .. } => Some(window.as_secs()),
            Selection::Full => None,
        }
    }
}

/// Opens sessions against the relational source.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(&self) -> AppResult<Box<dyn SourceSession>>;
}

/// One open connection, used sequentially for a whole run.
#[async_trait]
pub trait SourceSession: Send {
    /// Column names of `table` in ordinal order.
    async fn column_names(&mut self, table: &TableName) -> AppResult<Vec<String>>;

    /// Fully materialized result set for `selection`.
    async fn fetch_rows(&mut self, table: &TableName, selection: &Selection) -> AppResult<Vec<Row>>;

    /// Releases the connection. Later calls are no-ops.
    async fn close(&mut self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(300);

    #[test]
    fn updated_at_takes_precedence() {
        let selection = Selection::for_columns(&["id", "created_at", "updated_at"], WINDOW);
        assert_eq!(selection, Selection::Since { column: UPDATED_AT, window: WINDOW });
    }

    #[test]
    fn created_at_is_the_fallback() {
        let selection = Selection::for_columns(&["id", "created_at"], WINDOW);
        assert_eq!(selection.column(), Some(CREATED_AT));
    }

    #[test]
    fn tables_without_time_columns_are_copied_in_full() {
        let selection = Selection::for_columns(&["id", "name"], WINDOW);
        assert_eq!(selection, Selection::Full);
        assert_eq!(selection.window_secs(), None);
    }

    #[test]
    fn column_match_is_literal() {
        let selection = Selection::for_columns(&["Updated_At", "updated_at_old"], WINDOW);
        assert_eq!(selection, Selection::Full);
    }

    #[test]
    fn sql_filters_on_the_chosen_column() {
        let owners = TableName::parse("owners").unwrap();

        let since = Selection::for_columns(&["id", "updated_at"], WINDOW);
        assert_eq!(
            since.to_sql(&owners),
            "SELECT * FROM `owners` WHERE `updated_at` >= DATE_SUB(NOW(), INTERVAL ? SECOND)"
        );
        assert_eq!(since.window_secs(), Some(300));

        let full = Selection::Full;
        assert_eq!(full.to_sql(&owners), "SELECT * FROM `owners`");
    }
}
