// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth code exchange and state validation tests.
//!
//! These tests verify that:
//! 1. A matching (code, state) pair yields a usable token record
//! 2. A mismatched state aborts with InvalidState and no network call
//! 3. Provider error bodies are surfaced on failed exchanges

use serde_json::json;
use twin_monitor::error::AppError;
use twin_monitor::models::{AccountSlot, Provider, TwinId};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn slot() -> AccountSlot {
    AccountSlot::new(Provider::Oura, TwinId::TwinA)
}

#[tokio::test]
async fn test_exchange_code_returns_token_record() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth_code_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new_access",
            "refresh_token": "new_refresh",
            "expires_in": 86400,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let oauth_state = state.oauth.issue_state(slot()).unwrap();
    let record = state
        .oauth
        .exchange_code(slot(), "auth_code_123", &oauth_state)
        .await
        .unwrap();

    assert!(!record.access_token.is_empty());
    assert!(!record.refresh_token.is_empty());
    assert!(record.expires_at > chrono::Utc::now());
}

#[tokio::test]
async fn test_mismatched_state_makes_no_network_call() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    // Any hit on the token endpoint fails the test
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // State issued for twin B presented while connecting twin A
    let other_slot = AccountSlot::new(Provider::Oura, TwinId::TwinB);
    let oauth_state = state.oauth.issue_state(other_slot).unwrap();

    let result = state
        .oauth
        .exchange_code(slot(), "auth_code_123", &oauth_state)
        .await;

    assert!(matches!(result, Err(AppError::InvalidState)));
}

#[tokio::test]
async fn test_garbage_state_makes_no_network_call() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = state
        .oauth
        .exchange_code(slot(), "auth_code_123", "forged-state")
        .await;

    assert!(matches!(result, Err(AppError::InvalidState)));
}

#[tokio::test]
async fn test_rejected_code_surfaces_provider_body() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let oauth_state = state.oauth.issue_state(slot()).unwrap();
    let result = state
        .oauth
        .exchange_code(slot(), "used_code", &oauth_state)
        .await;

    match result {
        Err(AppError::TokenExchange(msg)) => assert!(msg.contains("invalid_grant")),
        other => panic!("expected TokenExchange error, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_rejected_refresh_token_is_refresh_error() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": "invalid_refresh_token" })),
        )
        .mount(&server)
        .await;

    let record = common::expired_record("old_access");
    let result = state.oauth.refresh(slot(), &record).await;

    assert!(matches!(result, Err(AppError::Refresh(_))));
}

#[tokio::test]
async fn test_refresh_keeps_old_refresh_token_when_not_rotated() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh_access",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let record = common::expired_record("old_access");
    let refreshed = state.oauth.refresh(slot(), &record).await.unwrap();

    assert_eq!(refreshed.access_token, "fresh_access");
    assert_eq!(refreshed.refresh_token, record.refresh_token);
}
