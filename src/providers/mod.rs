// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider-specific endpoint paths and response row parsing.
//!
//! Both providers answer metric GETs with the same envelope — a `data`
//! array and an optional `next_token` cursor — but each has its own row
//! shapes and field names. This module maps a [`Metric`] to the endpoint
//! path that serves it and extracts samples from raw rows.

pub mod oura;
pub mod polar;

use crate::models::{Metric, MetricSample, Provider};
use serde::Deserialize;

/// One page of a metric endpoint response.
#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Endpoint path (relative to the provider's API base) serving a metric.
///
/// Callers should only ask for metrics listed in `provider.metrics()`;
/// anything else is a programming error surfaced via the poller.
pub fn endpoint_path(provider: Provider, metric: Metric) -> Option<&'static str> {
    match provider {
        Provider::Oura => oura::endpoint_path(metric),
        Provider::Polar => polar::endpoint_path(metric),
    }
}

/// Extract a sample from one response row, if the row carries the metric.
///
/// Rows without the field (or with a null value) are skipped — missing days
/// stay absent from the series, never zero-filled.
pub fn sample_from_row(
    provider: Provider,
    metric: Metric,
    row: &serde_json::Value,
) -> Option<MetricSample> {
    match provider {
        Provider::Oura => oura::sample_from_row(metric, row),
        Provider::Polar => polar::sample_from_row(metric, row),
    }
}
