// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed token store for deployed environments.
//!
//! One document per slot in the collection named by `STORAGE_BUCKET_NAME`,
//! document id = slot key. Writes replace the whole document, which is
//! atomic on the Firestore side.

use crate::error::AppError;
use crate::models::{AccountSlot, TokenRecord};
use crate::store::TokenStore;
use async_trait::async_trait;

/// Cloud token store.
#[derive(Clone)]
pub struct FirestoreTokenStore {
    client: firestore::FirestoreDb,
    collection: String,
}

impl FirestoreTokenStore {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str, collection: &str) -> Result<Self, AppError> {
        // Unauthenticated connection for the emulator, to avoid local
        // credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::new_emulator(project_id, collection).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    async fn new_emulator(project_id: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Storage(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }
}

#[async_trait]
impl TokenStore for FirestoreTokenStore {
    async fn load(&self, slot: AccountSlot) -> Result<Option<TokenRecord>, AppError> {
        let result: Result<Option<TokenRecord>, _> = self
            .client
            .fluent()
            .select()
            .by_id_in(&self.collection)
            .obj()
            .one(&slot.key())
            .await;

        match result {
            Ok(record) => Ok(record),
            // Unreadable records (schema drift, partial writes from older
            // versions) count as absent, same as the file backend.
            Err(e) => {
                tracing::warn!(slot = %slot, error = %e, "Failed to load token record, treating as absent");
                Ok(None)
            }
        }
    }

    async fn save(&self, slot: AccountSlot, record: &TokenRecord) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(&self.collection)
            .document_id(slot.key())
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        tracing::debug!(slot = %slot, "Token record saved");
        Ok(())
    }

    async fn delete(&self, slot: AccountSlot) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(&self.collection)
            .document_id(slot.key())
            .execute()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(())
    }
}
