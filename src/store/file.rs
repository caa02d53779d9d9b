// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local-file token store for development.
//!
//! One JSON file per slot under the configured directory. Writes go to a
//! temporary file first and are renamed into place, so a crash mid-write
//! never leaves a slot unreadable.

use crate::error::AppError;
use crate::models::{AccountSlot, TokenRecord};
use crate::store::TokenStore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File-backed token store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, slot: AccountSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self, slot: AccountSlot) -> Result<Option<TokenRecord>, AppError> {
        let path = self.path_for(slot);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            // Missing file is the normal first-run state
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "Failed to read token file, treating as absent");
                return Ok(None);
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "Malformed token record, treating as absent");
                Ok(None)
            }
        }
    }

    async fn save(&self, slot: AccountSlot, record: &TokenRecord) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Storage(format!("create {}: {}", self.dir.display(), e)))?;

        let path = self.path_for(slot);
        let tmp = tmp_path(&path);

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| AppError::Storage(format!("serialize token record: {}", e)))?;

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| AppError::Storage(format!("write {}: {}", tmp.display(), e)))?;

        // Rename is atomic on the same filesystem
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Storage(format!("rename {}: {}", path.display(), e)))?;

        tracing::debug!(slot = %slot, "Token record saved");
        Ok(())
    }

    async fn delete(&self, slot: AccountSlot) -> Result<(), AppError> {
        let path = self.path_for(slot);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Deleting an absent slot is not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "delete {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
