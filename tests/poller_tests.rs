// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric poller tests: pagination, token refresh, and error mapping.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use twin_monitor::error::AppError;
use twin_monitor::models::{AccountSlot, Metric, Provider, TwinId};
use wiremock::matchers::{bearer_token, body_string_contains, method, path, query_param,
    query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

const SPO2_PATH: &str = "/usercollection/daily_spo2";

fn slot() -> AccountSlot {
    AccountSlot::new(Provider::Oura, TwinId::TwinA)
}

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn spo2_rows(from: i64, to: i64) -> Vec<Value> {
    (from..to)
        .map(|i| {
            json!({
                "day": day(i).to_string(),
                "spo2_percentage": { "average": 90.0 + (i % 8) as f64 }
            })
        })
        .collect()
}

fn page(rows: Vec<Value>, next_token: Option<&str>) -> Value {
    json!({ "data": rows, "next_token": next_token })
}

#[tokio::test]
async fn test_paginated_fetch_concatenates_in_date_order() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    common::connect_slot(&state, slot(), &common::valid_record("access")).await;

    // Cursor chain: page1 -> page2 -> page3 -> none, 100 samples each
    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(query_param("next_token", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(spo2_rows(100, 200), Some("page3"))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(query_param("next_token", "page3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(spo2_rows(200, 300), None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(query_param_is_missing("next_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(spo2_rows(0, 100), Some("page2"))))
        .expect(1)
        .mount(&server)
        .await;

    let samples = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(299))
        .await
        .unwrap();

    assert_eq!(samples.len(), 300);
    for (i, sample) in samples.iter().enumerate() {
        assert_eq!(sample.day, day(i as i64));
    }
}

#[tokio::test]
async fn test_expired_token_refreshed_exactly_once_before_fetch() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    common::connect_slot(&state, slot(), &common::expired_record("stale_access")).await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh_access",
            "refresh_token": "fresh_refresh",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The stale token must never reach the API
    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(bearer_token("stale_access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(bearer_token("fresh_access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(spo2_rows(0, 14), None)))
        .expect(1)
        .mount(&server)
        .await;

    let samples = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(13))
        .await
        .unwrap();

    assert_eq!(samples.len(), 14);

    // The refreshed record was persisted
    let stored = state.store.load(slot()).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "fresh_access");
    assert_eq!(stored.refresh_token, "fresh_refresh");
}

#[tokio::test]
async fn test_401_refreshes_and_retries_exactly_once() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    // Unexpired locally, but already revoked provider-side
    common::connect_slot(&state, slot(), &common::valid_record("revoked_access")).await;

    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(bearer_token("revoked_access"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh_access",
            "refresh_token": "fresh_refresh",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(bearer_token("fresh_access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(spo2_rows(0, 3), None)))
        .expect(1)
        .mount(&server)
        .await;

    let samples = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(2))
        .await
        .unwrap();

    assert_eq!(samples.len(), 3);
}

#[tokio::test]
async fn test_persistent_401_does_not_retry_forever() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    common::connect_slot(&state, slot(), &common::valid_record("revoked_access")).await;

    // Provider rejects every access token, fresh or not
    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh_access",
            "refresh_token": "fresh_refresh",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(2))
        .await;

    assert!(matches!(result, Err(AppError::Refresh(_))));
}

#[tokio::test]
async fn test_403_is_scope_error_and_never_refreshes() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    common::connect_slot(&state, slot(), &common::valid_record("access")).await;

    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("subscription required"))
        .expect(1)
        .mount(&server)
        .await;

    // A 403 is a permissions problem; refreshing would loop pointlessly
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(2))
        .await;

    match result {
        Err(AppError::ScopeOrSubscription(msg)) => assert!(msg.contains("subscription required")),
        other => panic!("expected ScopeOrSubscription, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_provider_429_maps_to_rate_limited() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    common::connect_slot(&state, slot(), &common::valid_record("access")).await;

    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(2))
        .await;

    assert!(matches!(result, Err(AppError::RateLimited { .. })));
}

#[tokio::test]
async fn test_disconnected_slot_is_not_connected_error() {
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());

    let result = state
        .dashboard
        .poller()
        .fetch_daily_metric(slot(), Metric::SpO2, day(0), day(2))
        .await;

    assert!(matches!(result, Err(AppError::NotConnected(_))));
}

#[tokio::test]
async fn test_two_week_spo2_scenario() {
    // start=2024-01-01, end=2024-01-14, valid token => 14 ordered samples
    let server = MockServer::start().await;
    let (_app, state, _dir) = common::create_mock_app(&server.uri());
    common::connect_slot(&state, slot(), &common::valid_record("access")).await;

    Mock::given(method("GET"))
        .and(path(SPO2_PATH))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(spo2_rows(0, 14), None)))
        .expect(1)
        .mount(&server)
        .await;

    let samples = state
        .dashboard
        .poller()
        .fetch_daily_metric(
            slot(),
            Metric::SpO2,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(samples.len(), 14);
    assert!(samples.windows(2).all(|w| w[0].day < w[1].day));
}
