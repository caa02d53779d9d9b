// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the authenticated dashboard session.

use crate::error::{AppError, Result};
use crate::models::{AccountSlot, Provider, TwinId};
use crate::services::dashboard::DashboardData;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Widest selectable range; wider requests are a client bug, not a
/// reason to hammer the provider APIs.
const MAX_RANGE_DAYS: i64 = 366;

/// Default range when the client sends no dates.
const DEFAULT_RANGE_DAYS: i64 = 14;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/slots", get(get_slots))
        .route("/api/connections/{provider}/{twin}", delete(disconnect))
}

// ─── Dashboard Data ──────────────────────────────────────────

#[derive(Deserialize)]
struct DashboardQuery {
    /// Range start (ISO 8601 date, inclusive)
    start_date: Option<String>,
    /// Range end (ISO 8601 date, inclusive)
    end_date: Option<String>,
}

fn parse_date(value: &str, name: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("{} is not an ISO 8601 date: {}", name, value)))
}

/// Validate the requested range, defaulting to the trailing two weeks.
fn resolve_range(query: &DashboardQuery) -> Result<(NaiveDate, NaiveDate)> {
    let today = Utc::now().date_naive();

    let end_date = match &query.end_date {
        Some(value) => parse_date(value, "end_date")?,
        None => today,
    };
    let start_date = match &query.start_date {
        Some(value) => parse_date(value, "start_date")?,
        None => end_date - Duration::days(DEFAULT_RANGE_DAYS),
    };

    if start_date > end_date {
        return Err(AppError::BadRequest(format!(
            "start_date {} is after end_date {}",
            start_date, end_date
        )));
    }
    if end_date - start_date > Duration::days(MAX_RANGE_DAYS) {
        return Err(AppError::BadRequest(format!(
            "date range wider than {} days",
            MAX_RANGE_DAYS
        )));
    }

    Ok((start_date, end_date))
}

/// Assemble both twins' metric series for the selected range.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardData>> {
    let (start_date, end_date) = resolve_range(&query)?;
    Ok(Json(state.dashboard.assemble(start_date, end_date).await))
}

// ─── Connection Status ───────────────────────────────────────

#[derive(Serialize)]
pub struct SlotStatus {
    pub provider: Provider,
    pub twin: TwinId,
    pub connected: bool,
}

#[derive(Serialize)]
pub struct RateStatus {
    pub provider: Provider,
    pub remaining: u32,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub slots: Vec<SlotStatus>,
    pub rate: Vec<RateStatus>,
}

/// Connection status per slot, from the store only - no provider calls.
async fn get_slots(State(state): State<Arc<AppState>>) -> Result<Json<SlotsResponse>> {
    let poller = state.dashboard.poller();
    let mut slots = Vec::new();

    for provider in state.config.enabled_providers() {
        for twin in TwinId::ALL {
            let slot = AccountSlot::new(provider, twin);
            slots.push(SlotStatus {
                provider,
                twin,
                connected: poller.is_connected(slot).await?,
            });
        }
    }

    let rate = state
        .config
        .enabled_providers()
        .into_iter()
        .map(|provider| RateStatus {
            provider,
            remaining: poller.rate_budget().remaining(provider),
        })
        .collect();

    Ok(Json(SlotsResponse { slots, rate }))
}

// ─── Disconnect ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
}

/// User-initiated disconnect: destroy the slot's token record.
///
/// Idempotent - disconnecting an absent slot succeeds.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path((provider, twin)): Path<(String, String)>,
) -> Result<Json<DisconnectResponse>> {
    let provider = Provider::parse(&provider)
        .ok_or_else(|| AppError::BadRequest(format!("unknown provider: {}", provider)))?;
    let twin = TwinId::parse(&twin)
        .ok_or_else(|| AppError::BadRequest(format!("unknown twin: {}", twin)))?;
    let slot = AccountSlot::new(provider, twin);

    state.store.delete(slot).await?;
    tracing::info!(slot = %slot, "Slot disconnected");

    Ok(Json(DisconnectResponse { success: true }))
}
