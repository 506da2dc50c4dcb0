//! Filesystem bucket store.
//!
//! Objects live under `<root>/objects/<bucket>/<path>`; their content type
//! and cache policy are kept next to them under `<root>/meta/`.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use kochbuch_core::backend::validate_object_path;
use kochbuch_core::{ObjectStorage, StorageError, StoredObject, UploadOptions, UrlSigner};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: String,
    cache_control: String,
}

pub struct FsStorage {
    root: PathBuf,
    signer: UrlSigner,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>, signer: UrlSigner) -> Self {
        Self {
            root: root.into(),
            signer,
        }
    }

    fn locate(&self, bucket: &str, path: &str) -> Result<(PathBuf, PathBuf), StorageError> {
        validate_object_path(bucket)?;
        validate_object_path(path)?;
        let object = self.root.join("objects").join(bucket).join(path);
        let meta = self
            .root
            .join("meta")
            .join(bucket)
            .join(format!("{}.json", path));
        Ok((object, meta))
    }
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::Io(e.to_string())
}

async fn ensure_parent(path: &std::path::Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for FsStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), StorageError> {
        let (object, meta) = self.locate(bucket, path)?;

        if !options.upsert && tokio::fs::try_exists(&object).await.map_err(io_error)? {
            return Err(StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }

        ensure_parent(&object).await?;
        ensure_parent(&meta).await?;

        let meta_json = serde_json::to_vec(&ObjectMeta {
            content_type: options.content_type.clone(),
            cache_control: options.cache_control.clone(),
        })
        .map_err(|e| StorageError::Io(e.to_string()))?;

        tokio::fs::write(&object, data).await.map_err(io_error)?;
        tokio::fs::write(&meta, meta_json).await.map_err(io_error)?;
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let (object, _) = self.locate(bucket, path)?;
        if !tokio::fs::try_exists(&object).await.map_err(io_error)? {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }
        Ok(self.signer.sign(bucket, path, ttl, Utc::now()))
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<StoredObject, StorageError> {
        let (object, meta) = self.locate(bucket, path)?;

        let data = match tokio::fs::read(&object).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                })
            }
            Err(e) => return Err(io_error(e)),
        };

        let meta: ObjectMeta = match tokio::fs::read(&meta).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StorageError::Io(e.to_string()))?
            }
            Err(_) => ObjectMeta {
                content_type: "application/octet-stream".to_string(),
                cache_control: "3600".to_string(),
            },
        };

        Ok(StoredObject {
            data,
            content_type: meta.content_type,
            cache_control: meta.cache_control,
        })
    }
}
