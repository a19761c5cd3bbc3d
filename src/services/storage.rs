use crate::config::{StorageConfig, StorageType};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Write-only access to the destination bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// `s3://bucket/key` style location used in log lines.
    fn location(&self, key: &str) -> String;
}

pub async fn build_object_store(config: &StorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.storage_type {
        StorageType::S3 => Ok(Arc::new(S3ObjectStore::from_config(config).await)),
        StorageType::Local => Ok(Arc::new(LocalObjectStore::new(
            config.local_path.join(&config.bucket),
        )?)),
    }
}

pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Credentials and region come from the default AWS provider chain.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            info!("Using custom S3 endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> AppResult<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to upload {}: {}",
                    self.location(key),
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        debug!("Put {} bytes to {}", size, self.location(key));
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

/// Writes objects as files under a root directory, one file per key.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> AppResult<Self> {
        std::fs::create_dir_all(&root).map_err(|e| {
            AppError::Storage(format!("Failed to create storage directory {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(AppError::Storage(format!("Invalid object key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>, _content_type: &str) -> AppResult<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, body)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {e}", path.display())))?;

        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("file://{}", self.root.join(key).display())
    }
}
