// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric polling against the provider REST APIs.
//!
//! Handles:
//! - Date-range GETs with cursor pagination
//! - Proactive token refresh before use (60s margin)
//! - Reactive refresh with exactly one retry on 401
//! - Fixed-window rate budget per provider (fail fast, never block)

use crate::error::AppError;
use crate::models::{AccountSlot, Metric, MetricSample, Provider, TokenRecord};
use crate::providers::{self, Page};
use crate::services::oauth::OAuthClient;
use crate::store::TokenStore;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Per-slot refresh locks, shared across clones of the poller.
type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Fixed-window request counter for one provider.
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Request budget tracking against each provider's published limit.
#[derive(Clone, Default)]
pub struct RateBudget {
    windows: Arc<DashMap<Provider, RateWindow>>,
}

impl RateBudget {
    /// Consume one request from the budget, or fail fast with `RateLimited`.
    fn check(&self, provider: Provider) -> Result<(), AppError> {
        let (limit, window) = provider.rate_limit();
        let now = Instant::now();

        let mut entry = self.windows.entry(provider).or_insert_with(|| RateWindow {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= limit {
            tracing::warn!(provider = %provider, "Request budget exhausted");
            return Err(AppError::RateLimited {
                provider: provider.as_str(),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Requests left in the current window.
    pub fn remaining(&self, provider: Provider) -> u32 {
        let (limit, window) = provider.rate_limit();
        match self.windows.get(&provider) {
            Some(w) if Instant::now().duration_since(w.window_start) < window => {
                limit.saturating_sub(w.count)
            }
            _ => limit,
        }
    }
}

/// Poller for daily metric series.
///
/// Token lifecycle is handled internally: the stored record is refreshed
/// proactively when inside the expiry margin, and refresh is serialized per
/// slot so concurrent fetches never spend the same refresh token twice.
#[derive(Clone)]
pub struct MetricPoller {
    http: reqwest::Client,
    oauth: OAuthClient,
    store: Arc<dyn TokenStore>,
    refresh_locks: RefreshLocks,
    rate: RateBudget,
    /// Test hook: route metric requests to a mock server.
    api_base_override: Option<String>,
}

impl MetricPoller {
    pub fn new(oauth: OAuthClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            oauth,
            store,
            refresh_locks: Arc::new(DashMap::new()),
            rate: RateBudget::default(),
            api_base_override: None,
        }
    }

    /// Poller whose metric GETs go to `api_base` (tests only).
    pub fn with_api_base(oauth: OAuthClient, store: Arc<dyn TokenStore>, api_base: String) -> Self {
        Self {
            api_base_override: Some(api_base),
            ..Self::new(oauth, store)
        }
    }

    pub fn rate_budget(&self) -> &RateBudget {
        &self.rate
    }

    fn api_base(&self, provider: Provider) -> String {
        self.api_base_override
            .clone()
            .unwrap_or_else(|| provider.api_base().to_string())
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Get a valid (non-expired) access token for the slot.
    ///
    /// Acquires the slot's refresh lock before reading the store, so when
    /// two callers race on an expired record the loser re-reads the
    /// winner's freshly saved tokens instead of refreshing again.
    async fn ensure_access_token(&self, slot: AccountSlot) -> Result<String, AppError> {
        let lock = self
            .refresh_locks
            .entry(slot.key())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let record = self
            .store
            .load(slot)
            .await?
            .ok_or_else(|| AppError::NotConnected(slot.key()))?;

        if !record.is_expired(chrono::Utc::now()) {
            return Ok(record.access_token);
        }

        tracing::info!(slot = %slot, "Access token expired, refreshing");
        self.refresh_and_save(slot, &record).await
    }

    /// Reactive refresh after a 401.
    ///
    /// If another task already replaced the rejected token we just use the
    /// stored one; otherwise refresh and persist.
    async fn refresh_after_unauthorized(
        &self,
        slot: AccountSlot,
        rejected_token: &str,
    ) -> Result<String, AppError> {
        let lock = self
            .refresh_locks
            .entry(slot.key())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let record = self
            .store
            .load(slot)
            .await?
            .ok_or_else(|| AppError::NotConnected(slot.key()))?;

        if record.access_token != rejected_token {
            return Ok(record.access_token);
        }

        tracing::info!(slot = %slot, "Access token rejected (401), refreshing");
        self.refresh_and_save(slot, &record).await
    }

    async fn refresh_and_save(
        &self,
        slot: AccountSlot,
        record: &TokenRecord,
    ) -> Result<String, AppError> {
        let new_record = self.oauth.refresh(slot, record).await?;
        self.store.save(slot, &new_record).await?;
        Ok(new_record.access_token)
    }

    // ─── Metric Fetching ─────────────────────────────────────────────────────

    /// Fetch a metric's daily series for an inclusive date range.
    ///
    /// Follows pagination cursors until exhausted; the result is sorted by
    /// day with duplicate days dropped (first occurrence wins).
    pub async fn fetch_daily_metric(
        &self,
        slot: AccountSlot,
        metric: Metric,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<MetricSample>, AppError> {
        let path = providers::endpoint_path(slot.provider, metric).ok_or_else(|| {
            AppError::BadRequest(format!("{} does not serve {}", slot.provider, metric))
        })?;
        let url = format!("{}{}", self.api_base(slot.provider), path);

        let mut access_token = self.ensure_access_token(slot).await?;
        let mut samples: Vec<MetricSample> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut retried_after_refresh = false;

        loop {
            self.rate.check(slot.provider)?;

            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&access_token)
                .query(&[
                    ("start_date", start_date.to_string()),
                    ("end_date", end_date.to_string()),
                ]);
            if let Some(token) = &cursor {
                request = request.query(&[("next_token", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AppError::Transport(e.to_string()))?;
            let status = response.status();

            if status.as_u16() == 401 {
                if retried_after_refresh {
                    // The refreshed token was rejected too; do not loop.
                    return Err(AppError::Refresh(
                        "access token rejected after refresh".to_string(),
                    ));
                }
                retried_after_refresh = true;
                access_token = self.refresh_after_unauthorized(slot, &access_token).await?;
                continue; // retry the same page once
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(match status.as_u16() {
                    // Permissions/subscription problem, not an auth failure:
                    // refreshing would loop without fixing anything.
                    403 => AppError::ScopeOrSubscription(body),
                    429 => AppError::RateLimited {
                        provider: slot.provider.as_str(),
                    },
                    _ => AppError::Transport(format!("HTTP {}: {}", status, body)),
                });
            }

            let page: Page = response
                .json()
                .await
                .map_err(|e| AppError::Transport(format!("JSON parse error: {}", e)))?;

            for row in &page.data {
                if let Some(sample) = providers::sample_from_row(slot.provider, metric, row) {
                    samples.push(sample);
                }
            }

            match page.next_token {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        samples.sort_by_key(|s| s.day);
        samples.dedup_by_key(|s| s.day);

        tracing::debug!(
            slot = %slot,
            metric = %metric,
            count = samples.len(),
            "Fetched daily metric series"
        );

        Ok(samples)
    }

    /// Whether a slot has a stored token record (no provider call).
    pub async fn is_connected(&self, slot: AccountSlot) -> Result<bool, AppError> {
        Ok(self.store.load(slot).await?.is_some())
    }
}
