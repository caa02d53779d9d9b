// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token persistence layer.
//!
//! One record per account slot, keyed by `{provider}_{twin_id}`. Two
//! backends: a local JSON-file store for development and a Firestore-backed
//! store for deployments that must survive process restarts.

pub mod file;
pub mod firestore;

pub use file::FileTokenStore;
pub use firestore::FirestoreTokenStore;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{AccountSlot, TokenRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable key-value persistence of one token record per account slot.
///
/// `load` treats missing and malformed records as absent — first-run absence
/// is a normal state, not an error. `save` must be atomic; `delete` is
/// idempotent.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self, slot: AccountSlot) -> Result<Option<TokenRecord>, AppError>;
    async fn save(&self, slot: AccountSlot, record: &TokenRecord) -> Result<(), AppError>;
    async fn delete(&self, slot: AccountSlot) -> Result<(), AppError>;
}

/// Build the token store backend selected by configuration.
///
/// `STORAGE_BUCKET_NAME` set selects the cloud backend; absent selects the
/// local-file backend (which does not survive redeployment).
pub async fn from_config(config: &Config) -> Result<Arc<dyn TokenStore>, AppError> {
    match &config.storage_bucket_name {
        Some(bucket) => {
            let store = FirestoreTokenStore::new(&config.gcp_project_id, bucket).await?;
            tracing::info!(bucket = %bucket, "Using cloud token store");
            Ok(Arc::new(store))
        }
        None => {
            let store = FileTokenStore::new(config.token_dir.clone());
            tracing::info!(dir = %config.token_dir.display(), "Using local file token store");
            Ok(Arc::new(store))
        }
    }
}
