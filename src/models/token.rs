// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token records as persisted per account slot.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin before token expiration when we proactively refresh.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// One slot's OAuth tokens.
///
/// Serialized as JSON for both store backends. Mutated only by replacing the
/// whole record on refresh; destroyed on disconnect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque bearer credential for API calls
    pub access_token: String,
    /// Opaque credential used to obtain a new access token
    pub refresh_token: String,
    /// Absolute expiry of the access token
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Build a record from a token endpoint response (`expires_in` seconds).
    pub fn from_response(
        access_token: String,
        refresh_token: String,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: now + Duration::seconds(expires_in),
        }
    }

    /// Whether the access token should be refreshed before use.
    ///
    /// Expired means `now >= expires_at - margin`, so a token within the
    /// safety margin is refreshed proactively rather than risking a 401.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.expires_at
    }
}
