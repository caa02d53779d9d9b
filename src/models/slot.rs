// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account slots: the (provider, twin) pairing that owns one OAuth connection.

use crate::models::Metric;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One of the two tracked subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwinId {
    TwinA,
    TwinB,
}

impl TwinId {
    pub const ALL: [TwinId; 2] = [TwinId::TwinA, TwinId::TwinB];

    pub fn as_str(&self) -> &'static str {
        match self {
            TwinId::TwinA => "twin_a",
            TwinId::TwinB => "twin_b",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "twin_a" => Some(TwinId::TwinA),
            "twin_b" => Some(TwinId::TwinB),
            _ => None,
        }
    }
}

impl fmt::Display for TwinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported data provider.
///
/// Endpoint URLs and scopes are fixed per provider; only the OAuth client
/// credentials come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Oura,
    Polar,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Oura, Provider::Polar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Oura => "oura",
            Provider::Polar => "polar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "oura" => Some(Provider::Oura),
            "polar" => Some(Provider::Polar),
            _ => None,
        }
    }

    /// Browser-redirect authorization endpoint.
    pub fn authorize_url(&self) -> &'static str {
        match self {
            Provider::Oura => "https://cloud.ouraring.com/oauth/authorize",
            Provider::Polar => "https://flow.polar.com/oauth2/authorization",
        }
    }

    /// Token endpoint for code exchange and refresh.
    pub fn token_url(&self) -> &'static str {
        match self {
            Provider::Oura => "https://api.ouraring.com/oauth/token",
            Provider::Polar => "https://polarremote.com/v2/oauth2/token",
        }
    }

    /// Base URL for metric endpoints.
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::Oura => "https://api.ouraring.com/v2",
            Provider::Polar => "https://www.polaraccesslink.com",
        }
    }

    /// OAuth scopes requested at authorization.
    pub fn scopes(&self) -> &'static str {
        match self {
            Provider::Oura => "email personal daily heartrate workout spo2",
            Provider::Polar => "accesslink.read_all",
        }
    }

    /// Published rate limit: (requests, fixed window).
    pub fn rate_limit(&self) -> (u32, Duration) {
        match self {
            // 5000 requests per 5 minutes
            Provider::Oura => (5000, Duration::from_secs(300)),
            // 500 requests per 15 minutes
            Provider::Polar => (500, Duration::from_secs(900)),
        }
    }

    /// The daily metrics this provider serves.
    pub fn metrics(&self) -> &'static [Metric] {
        match self {
            Provider::Oura => &[
                Metric::SpO2,
                Metric::RestingHeartRate,
                Metric::Hrv,
                Metric::RespiratoryRate,
                Metric::SleepScore,
            ],
            Provider::Polar => &[
                Metric::RestingHeartRate,
                Metric::Hrv,
                Metric::SleepScore,
                Metric::WorkoutHeartRate,
                Metric::TrainingLoad,
            ],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (provider, twin) pairing that owns one OAuth connection and one
/// token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountSlot {
    pub provider: Provider,
    pub twin: TwinId,
}

impl AccountSlot {
    pub fn new(provider: Provider, twin: TwinId) -> Self {
        Self { provider, twin }
    }

    /// Storage key: `{provider}_{twin_id}`, e.g. `oura_twin_a`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.provider, self.twin)
    }

    /// Parse a storage key back into a slot.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (provider, twin) = key.split_once('_')?;
        Some(Self {
            provider: Provider::parse(provider)?,
            twin: TwinId::parse(twin)?,
        })
    }
}

impl fmt::Display for AccountSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_key_round_trip() {
        for provider in Provider::ALL {
            for twin in TwinId::ALL {
                let slot = AccountSlot::new(provider, twin);
                assert_eq!(AccountSlot::parse_key(&slot.key()), Some(slot));
            }
        }
    }

    #[test]
    fn test_slot_key_format() {
        let slot = AccountSlot::new(Provider::Oura, TwinId::TwinA);
        assert_eq!(slot.key(), "oura_twin_a");
    }

    #[test]
    fn test_parse_key_rejects_garbage() {
        assert_eq!(AccountSlot::parse_key("garmin_twin_a"), None);
        assert_eq!(AccountSlot::parse_key("oura_twin_c"), None);
        assert_eq!(AccountSlot::parse_key("oura"), None);
        assert_eq!(AccountSlot::parse_key(""), None);
    }
}
