// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 authorization-code flow against the provider cloud APIs.
//!
//! Handles:
//! - Authorization URL construction with a signed anti-CSRF state
//! - Code-for-token exchange
//! - Token refresh

use crate::config::{Config, ProviderCredentials};
use crate::error::AppError;
use crate::models::{AccountSlot, Provider, TokenRecord};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// OAuth client for all configured providers.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    config: Config,
    /// Test hook: route token requests to a mock server.
    token_url_override: Option<String>,
}

impl OAuthClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token_url_override: None,
        }
    }

    /// Client whose token-endpoint POSTs go to `token_url` (tests only).
    pub fn with_token_url(config: Config, token_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token_url_override: Some(token_url),
        }
    }

    fn token_url(&self, provider: Provider) -> String {
        self.token_url_override
            .clone()
            .unwrap_or_else(|| provider.token_url().to_string())
    }

    fn credentials(&self, provider: Provider) -> Result<&ProviderCredentials, AppError> {
        self.config
            .credentials_for(provider)
            .ok_or_else(|| AppError::BadRequest(format!("provider {} is not configured", provider)))
    }

    // ─── State Parameter ─────────────────────────────────────────────────────

    /// Issue a signed state value for a slot's authorization redirect.
    ///
    /// Format: base64url("{slot_key}|{timestamp_hex}|{hmac_hex}"). The slot
    /// key is embedded so the callback knows which slot is completing; the
    /// signature prevents a forged callback from binding a code to a
    /// different slot.
    pub fn issue_state(&self, slot: AccountSlot) -> Result<String, AppError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
            .as_millis();

        let payload = format!("{}|{:x}", slot.key(), timestamp);

        let mut mac = HmacSha256::new_from_slice(&self.config.oauth_state_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature).as_bytes()))
    }

    /// Verify a callback state against the slot it claims to complete.
    pub fn verify_state(&self, slot: AccountSlot, state: &str) -> Result<(), AppError> {
        match self.slot_from_state(state) {
            Some(s) if s == slot => Ok(()),
            _ => Err(AppError::InvalidState),
        }
    }

    /// Verify a state's signature and extract the slot embedded in it.
    ///
    /// Returns None for tampered, malformed or foreign-key states.
    pub fn slot_from_state(&self, state: &str) -> Option<AccountSlot> {
        let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
        let state_str = String::from_utf8(bytes).ok()?;

        // Format is "{slot_key}|{timestamp_hex}|{signature_hex}"
        let parts: Vec<&str> = state_str.splitn(3, '|').collect();
        if parts.len() != 3 {
            return None;
        }

        let slot_key = parts[0];
        let timestamp_hex = parts[1];
        let signature_hex = parts[2];

        let payload = format!("{}|{}", slot_key, timestamp_hex);

        let mut mac = HmacSha256::new_from_slice(&self.config.oauth_state_key).ok()?;
        mac.update(payload.as_bytes());
        let expected_signature = hex::encode(mac.finalize().into_bytes());

        if signature_hex != expected_signature {
            tracing::error!("OAuth state signature mismatch! Potential tampering.");
            return None;
        }

        AccountSlot::parse_key(slot_key)
    }

    // ─── Authorization ───────────────────────────────────────────────────────

    /// Build the provider authorization URL for a slot. No side effects.
    pub fn build_authorize_url(
        &self,
        slot: AccountSlot,
        state: &str,
    ) -> Result<String, AppError> {
        let creds = self.credentials(slot.provider)?;

        Ok(format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            slot.provider.authorize_url(),
            urlencoding::encode(&creds.client_id),
            urlencoding::encode(&creds.redirect_uri),
            urlencoding::encode(slot.provider.scopes()),
            urlencoding::encode(state),
        ))
    }

    /// Exchange an authorization code for a fresh token record.
    ///
    /// The state is validated before anything goes on the wire; a mismatch
    /// aborts with `InvalidState` and no network call.
    pub async fn exchange_code(
        &self,
        slot: AccountSlot,
        code: &str,
        state: &str,
    ) -> Result<TokenRecord, AppError> {
        self.verify_state(slot, state)?;
        let creds = self.credentials(slot.provider)?;

        let response = self
            .http
            .post(self.token_url(slot.provider))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("redirect_uri", creds.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(slot = %slot, status = %status, body = %body, "Token exchange failed");
            return Err(AppError::TokenExchange(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::TokenExchange(format!("Malformed token response: {}", e)))?;

        let refresh_token = token
            .refresh_token
            .ok_or_else(|| AppError::TokenExchange("Response missing refresh_token".to_string()))?;

        tracing::info!(slot = %slot, "Authorization code exchanged");

        Ok(TokenRecord::from_response(
            token.access_token,
            refresh_token,
            token.expires_in,
            chrono::Utc::now(),
        ))
    }

    /// Refresh an expired access token.
    ///
    /// A rejected refresh token is terminal for the slot: the caller should
    /// treat it as disconnected and prompt the user to reconnect.
    pub async fn refresh(
        &self,
        slot: AccountSlot,
        record: &TokenRecord,
    ) -> Result<TokenRecord, AppError> {
        let creds = self.credentials(slot.provider)?;

        let response = self
            .http
            .post(self.token_url(slot.provider))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", record.refresh_token.as_str()),
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(slot = %slot, status = %status, "Refresh token rejected");
            return Err(AppError::Refresh(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Refresh(format!("Malformed refresh response: {}", e)))?;

        tracing::info!(slot = %slot, "Access token refreshed");

        // Providers may rotate the refresh token; keep the old one when the
        // response omits it.
        Ok(TokenRecord::from_response(
            token.access_token,
            token
                .refresh_token
                .unwrap_or_else(|| record.refresh_token.clone()),
            token.expires_in,
            chrono::Utc::now(),
        ))
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}
