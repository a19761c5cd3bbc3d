use crate::error::{AppError, AppResult};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_MYSQL_PORT: u16 = 3306;

#[derive(Clone, Debug)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub export: ExportConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
    /// Session `time_zone`. `None` keeps the server's default zone, which is
    /// the zone `NOW()` and stored DATETIME values are compared in.
    pub time_zone: Option<String>,
}

// Keeps the password out of logs.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: StorageType,
    pub bucket: String,
    pub endpoint_url: Option<String>,
    pub local_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StorageType {
    S3,
    Local,
}

#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// How far back `updated_at` / `created_at` filters reach.
    pub window: Duration,
}

#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests can inject a fake environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> AppResult<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("missing required environment variable {key}")))
        };

        let parse_env_var = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let parse_env_number = |key: &str, default: u64| -> AppResult<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|e| AppError::Config(format!("invalid value for {key}: {e}"))),
                None => Ok(default),
            }
        };

        let parse_env_duration = |key: &str, default_secs: u64| -> AppResult<Duration> {
            Ok(Duration::from_secs(parse_env_number(key, default_secs)?))
        };

        let parse_env_bool = |key: &str, default: bool| -> AppResult<bool> {
            match lookup(key) {
                Some(raw) => match raw.trim().to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Ok(true),
                    "false" | "0" | "no" | "off" | "" => Ok(false),
                    other => Err(AppError::Config(format!("invalid boolean for {key}: {other}"))),
                },
                None => Ok(default),
            }
        };

        let (host, port) = parse_endpoint(&required("RDS_ENDPOINT")?)?;

        let storage_type = match parse_env_var("DB_SYNC_STORAGE_TYPE", "s3").to_lowercase().as_str() {
            "s3" => StorageType::S3,
            "local" => StorageType::Local,
            other => {
                return Err(AppError::Config(format!("unknown storage type: {other}")));
            }
        };

        let window = parse_env_duration("DB_SYNC_WINDOW_SECS", 300)?;
        if window.is_zero() {
            return Err(AppError::Config("DB_SYNC_WINDOW_SECS must be positive".to_string()));
        }
        let interval = parse_env_duration("DB_SYNC_INTERVAL_SECS", 300)?;
        if interval.is_zero() {
            return Err(AppError::Config("DB_SYNC_INTERVAL_SECS must be positive".to_string()));
        }

        Ok(Config {
            database: DatabaseConfig {
                host,
                port,
                database: required("DB_NAME")?,
                username: required("DB_USERNAME")?,
                password: required("DB_PASSWORD")?,
                connect_timeout: parse_env_duration("DB_SYNC_CONNECT_TIMEOUT_SECS", 5)?,
                time_zone: lookup("DB_SYNC_SESSION_TIME_ZONE")
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            },
            storage: StorageConfig {
                storage_type,
                bucket: required("S3_BUCKET")?,
                endpoint_url: lookup("S3_ENDPOINT_URL").filter(|v| !v.trim().is_empty()),
                local_path: PathBuf::from(parse_env_var("DB_SYNC_LOCAL_PATH", "./backups-local")),
            },
            export: ExportConfig { window },
            schedule: ScheduleConfig {
                interval,
                run_once: parse_env_bool("DB_SYNC_RUN_ONCE", false)?,
            },
        })
    }
}

/// Splits `host[:port]`.
fn parse_endpoint(endpoint: &str) -> AppResult<(String, u16)> {
    match endpoint.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|e| AppError::Config(format!("invalid port in RDS_ENDPOINT {endpoint}: {e}")))?;
            if host.is_empty() {
                return Err(AppError::Config(format!("missing host in RDS_ENDPOINT {endpoint}")));
            }
            Ok((host.to_string(), port))
        }
        None => Ok((endpoint.to_string(), DEFAULT_MYSQL_PORT)),
    }
}
