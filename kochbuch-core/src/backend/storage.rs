use async_trait::async_trait;
use chrono::Duration;

use crate::error::StorageError;

/// Options attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Value served as `Cache-Control: max-age=<seconds>`.
    pub cache_control: String,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
    pub content_type: String,
}

impl UploadOptions {
    /// Options used for user images: one hour of caching, overwrite on conflict.
    pub fn image(content_type: impl Into<String>) -> Self {
        Self {
            cache_control: "3600".to_string(),
            upsert: true,
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), StorageError>;

    /// Time-limited URL granting read access to one object.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<StoredObject, StorageError>;
}

/// Object paths are relative, `/`-separated and may not escape their bucket.
pub fn validate_object_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    let bad_segment = path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad_segment {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    Ok(())
}
