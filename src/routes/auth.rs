// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard login and provider OAuth routes.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::{AccountSlot, Provider, TwinId};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/connect/{provider}/{twin}", get(connect_start))
        .route("/auth/callback/{provider}", get(connect_callback))
}

// ─── Dashboard Login ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Constant-time string comparison for credentials.
fn credentials_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

/// Log in with the configured dashboard credentials.
///
/// Sets the session cookie and also returns the JWT for bearer-style use.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let user_ok = credentials_match(&request.username, &state.config.authorized_user);
    let password_ok = credentials_match(&request.password, &state.config.authorized_password);

    if !(user_ok && password_ok) {
        tracing::warn!(username = %request.username, "Failed login attempt");
        return Err(AppError::Unauthorized);
    }

    let jwt = create_jwt(&request.username, &state.config.session_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(username = %request.username, "Dashboard login");

    Ok((jar.add(cookie), Json(LoginResponse { token: jwt })))
}

/// Log out by clearing the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(Cookie::from(SESSION_COOKIE)), Redirect::temporary("/"))
}

// ─── Provider OAuth ──────────────────────────────────────────

fn parse_slot(provider: &str, twin: &str) -> Result<AccountSlot> {
    let provider = Provider::parse(provider)
        .ok_or_else(|| AppError::BadRequest(format!("unknown provider: {}", provider)))?;
    let twin = TwinId::parse(twin)
        .ok_or_else(|| AppError::BadRequest(format!("unknown twin: {}", twin)))?;
    Ok(AccountSlot::new(provider, twin))
}

/// Start the OAuth flow for a slot - redirect to the provider.
async fn connect_start(
    State(state): State<Arc<AppState>>,
    Path((provider, twin)): Path<(String, String)>,
) -> Result<Redirect> {
    let slot = parse_slot(&provider, &twin)?;

    let oauth_state = state.oauth.issue_state(slot)?;
    let auth_url = state.oauth.build_authorize_url(slot, &oauth_state)?;

    tracing::info!(slot = %slot, "Starting OAuth flow, redirecting to provider");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange the code and persist the slot's tokens.
///
/// Always lands back on the frontend: provider-reported errors and state
/// validation failures redirect with an `error` query parameter instead of
/// rendering a bare API error page.
async fn connect_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    let frontend_url = &state.config.frontend_url;

    let provider = Provider::parse(&provider)
        .ok_or_else(|| AppError::BadRequest(format!("unknown provider: {}", provider)))?;

    // User denied the consent screen, or the provider reported an error
    if let Some(error) = params.error {
        tracing::warn!(provider = %provider, error = %error, "OAuth error from provider");
        return Ok(Redirect::temporary(&format!(
            "{}?error={}",
            frontend_url,
            urlencoding::encode(&error)
        )));
    }

    let (code, oauth_state) = match (params.code, params.state) {
        (Some(code), Some(state)) => (code, state),
        _ => {
            return Ok(Redirect::temporary(&format!(
                "{}?error=missing_code_or_state",
                frontend_url
            )));
        }
    };

    // The slot completing the flow is embedded in the signed state
    let slot = match state.oauth.slot_from_state(&oauth_state) {
        Some(slot) if slot.provider == provider => slot,
        _ => {
            tracing::warn!(provider = %provider, "OAuth state validation failed");
            return Ok(Redirect::temporary(&format!(
                "{}?error=invalid_state",
                frontend_url
            )));
        }
    };

    let record = match state.oauth.exchange_code(slot, &code, &oauth_state).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(slot = %slot, error = %e, "Token exchange failed");
            return Ok(Redirect::temporary(&format!(
                "{}?error=token_exchange_failed",
                frontend_url
            )));
        }
    };

    state.store.save(slot, &record).await?;

    tracing::info!(slot = %slot, "OAuth callback handled, tokens stored");

    Ok(Redirect::temporary(&format!(
        "{}?connected={}",
        frontend_url,
        slot.key()
    )))
}
