// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use twin_monitor::config::Config;
use twin_monitor::models::{AccountSlot, TokenRecord};
use twin_monitor::routes::create_router;
use twin_monitor::services::{DashboardService, MetricPoller, OAuthClient};
use twin_monitor::store::{FileTokenStore, TokenStore};
use twin_monitor::AppState;

/// Create a test app with a file token store in a temp directory.
/// Returns the router, the shared state, and the temp dir guard.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TempDir) {
    build_app(Config::test_default(), None)
}

/// Create a test app whose OAuth token endpoint and metric API base both
/// point at a mock server.
#[allow(dead_code)]
pub fn create_mock_app(mock_uri: &str) -> (axum::Router, Arc<AppState>, TempDir) {
    build_app(Config::test_default(), Some(mock_uri))
}

fn build_app(config: Config, mock_uri: Option<&str>) -> (axum::Router, Arc<AppState>, TempDir) {
    let token_dir = TempDir::new().expect("Failed to create temp token dir");
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(token_dir.path().to_path_buf()));

    let oauth = match mock_uri {
        Some(uri) => OAuthClient::with_token_url(config.clone(), format!("{}/oauth/token", uri)),
        None => OAuthClient::new(config.clone()),
    };
    let poller = match mock_uri {
        Some(uri) => MetricPoller::with_api_base(oauth.clone(), store.clone(), uri.to_string()),
        None => MetricPoller::new(oauth.clone(), store.clone()),
    };
    let dashboard = DashboardService::new(poller, config.enabled_providers());

    let state = Arc::new(AppState {
        config,
        store,
        oauth,
        dashboard,
    });

    (create_router(state.clone()), state, token_dir)
}

/// Create a session JWT signed with the test config's key.
#[allow(dead_code)]
pub fn create_test_jwt(state: &AppState) -> String {
    twin_monitor::middleware::auth::create_jwt(
        &state.config.authorized_user,
        &state.config.session_signing_key,
    )
    .expect("Failed to create test JWT")
}

/// A token record that will not need a refresh.
#[allow(dead_code)]
pub fn valid_record(access_token: &str) -> TokenRecord {
    TokenRecord {
        access_token: access_token.to_string(),
        refresh_token: "test_refresh".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// A token record past its expiry.
#[allow(dead_code)]
pub fn expired_record(access_token: &str) -> TokenRecord {
    TokenRecord {
        access_token: access_token.to_string(),
        refresh_token: "test_refresh".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
    }
}

/// Persist a record for a slot.
#[allow(dead_code)]
pub async fn connect_slot(state: &AppState, slot: AccountSlot, record: &TokenRecord) {
    state
        .store
        .save(slot, record)
        .await
        .expect("Failed to save token record");
}
