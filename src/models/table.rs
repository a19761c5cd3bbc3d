use crate::error::{AppError, AppResult};
use std::fmt;

/// Tables copied on every run, in export order.
pub const BACKUP_TABLES: [&str; 7] = [
    "owners",
    "pets",
    "visits",
    "vets",
    "specialties",
    "vet_specialties",
    "types",
];

/// A table identifier that has passed the allow-list check and is safe to quote into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn parse(name: &str) -> AppResult<Self> {
        if !is_identifier(name) {
            return Err(AppError::Config(format!("invalid table identifier: {name:?}")));
        }
        if !BACKUP_TABLES.contains(&name) {
            return Err(AppError::Config(format!("table {name} is not in the backup list")));
        }
        Ok(Self(name.to_string()))
    }

    /// The fixed backup list, each name checked the same way as `parse`.
    pub fn configured() -> AppResult<Vec<Self>> {
        BACKUP_TABLES
            .iter()
            .map(|name| {
                Self::parse(name)
                    .map_err(|e| AppError::Internal(format!("built-in table list rejected: {e}")))
            })
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for MySQL statements.
    pub fn quoted(&self) -> String {
        quote_identifier(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
