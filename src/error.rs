use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    Config(String),
    Connection(String),
    Query(String),
    Serialization(String),
    Storage(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
    pub error_type: String,
}

impl AppError {
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::Connection(_) => "connection_error",
            AppError::Query(_) => "query_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Body of a failed run response.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            message: "Database backup failed".to_string(),
            error: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {msg}"),
            AppError::Connection(msg) => write!(f, "Connection error: {msg}"),
            AppError::Query(msg) => write!(f, "Query error: {msg}"),
            AppError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            AppError::Storage(msg) => write!(f, "Storage error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_type_and_prefixed_message() {
        let err = AppError::Connection("timed out after 5s".to_string());
        let body = err.to_body();

        assert_eq!(body.message, "Database backup failed");
        assert_eq!(body.error, "Connection error: timed out after 5s");
        assert_eq!(body.error_type, "connection_error");
    }
}
