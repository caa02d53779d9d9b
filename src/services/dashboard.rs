// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard assembly: per-twin metric series for the rendering layer.
//!
//! Every provider-facing error is recovered here into a per-slot
//! "unavailable" state with a human-readable reason. One twin's dead
//! connection or API trouble never blocks the other twin's data.

use crate::error::AppError;
use crate::models::{AccountSlot, MetricSeries, Provider, TwinId};
use crate::services::poller::MetricPoller;
use chrono::NaiveDate;
use serde::Serialize;

/// Series and status for one account slot.
#[derive(Debug, Serialize)]
pub struct SlotData {
    pub provider: Provider,
    /// False when the slot has no token record (or its tokens are dead)
    pub connected: bool,
    /// Human-readable reason when data could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable: Option<String>,
    pub series: Vec<MetricSeries>,
}

/// All slots for one twin.
#[derive(Debug, Serialize)]
pub struct TwinData {
    pub twin: TwinId,
    pub slots: Vec<SlotData>,
}

/// The assembled dashboard payload.
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub twins: Vec<TwinData>,
}

/// Orchestrates token validity and metric fetching per twin.
#[derive(Clone)]
pub struct DashboardService {
    poller: MetricPoller,
    providers: Vec<Provider>,
}

impl DashboardService {
    /// `providers` is the configured subset (Polar may be disabled).
    pub fn new(poller: MetricPoller, providers: Vec<Provider>) -> Self {
        Self { poller, providers }
    }

    pub fn poller(&self) -> &MetricPoller {
        &self.poller
    }

    /// Assemble both twins' series for an inclusive date range.
    pub async fn assemble(&self, start_date: NaiveDate, end_date: NaiveDate) -> DashboardData {
        let mut twins = Vec::with_capacity(TwinId::ALL.len());

        for twin in TwinId::ALL {
            let mut slots = Vec::with_capacity(self.providers.len());
            for provider in &self.providers {
                let slot = AccountSlot::new(*provider, twin);
                slots.push(self.fetch_slot(slot, start_date, end_date).await);
            }
            twins.push(TwinData { twin, slots });
        }

        DashboardData {
            start_date,
            end_date,
            twins,
        }
    }

    /// Fetch one slot's metric set, degrading instead of failing.
    ///
    /// A disconnected slot is a normal state, not an error. A failure on
    /// one metric keeps whatever was already fetched and reports the
    /// reason; dead tokens additionally flip the slot to disconnected so
    /// the UI prompts a reconnect.
    async fn fetch_slot(
        &self,
        slot: AccountSlot,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> SlotData {
        let mut series = Vec::with_capacity(slot.provider.metrics().len());

        for metric in slot.provider.metrics() {
            match self
                .poller
                .fetch_daily_metric(slot, *metric, start_date, end_date)
                .await
            {
                Ok(samples) => series.push(MetricSeries::new(*metric, samples)),
                Err(AppError::NotConnected(_)) => {
                    return SlotData {
                        provider: slot.provider,
                        connected: false,
                        unavailable: None,
                        series: Vec::new(),
                    };
                }
                Err(e) => {
                    tracing::warn!(slot = %slot, metric = %metric, error = %e, "Slot data unavailable");
                    return SlotData {
                        provider: slot.provider,
                        connected: !e.is_token_error(),
                        unavailable: Some(e.to_string()),
                        series,
                    };
                }
            }
        }

        SlotData {
            provider: slot.provider,
            connected: true,
            unavailable: None,
            series,
        }
    }
}
