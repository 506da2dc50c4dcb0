//! Data-access layer shared by the HTTP server, the CLI and the tests.
//!
//! `Kitchen` wraps the relational store and the object storage. Its
//! operations are split by entity across `recipes`, `favorites`, `uploads`,
//! `profile` and `cart`.

use std::sync::Arc;

use crate::backend::{ObjectStorage, Store};
use crate::error::{DataError, StorageError, StoreError};

#[derive(Clone)]
pub struct Kitchen {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) storage: Arc<dyn ObjectStorage>,
}

impl Kitchen {
    pub fn new(store: Arc<dyn Store>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { store, storage }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }
}

impl std::fmt::Debug for Kitchen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kitchen").finish_non_exhaustive()
    }
}

/// Log a store failure and lift it into [`DataError`].
pub(crate) fn store_failure(action: &'static str) -> impl Fn(StoreError) -> DataError {
    move |e| {
        tracing::error!("Failed to {}: {}", action, e);
        DataError::Store(e)
    }
}

pub(crate) fn storage_failure(action: &'static str) -> impl Fn(StorageError) -> DataError {
    move |e| {
        tracing::error!("Failed to {}: {}", action, e);
        DataError::Storage(e)
    }
}
