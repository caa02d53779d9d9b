// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("OAuth state mismatch")]
    InvalidState,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("Rate limit reached for {provider}")]
    RateLimited { provider: &'static str },

    #[error("Permission or subscription error: {0}")]
    ScopeOrSubscription(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("No connection for slot {0}")]
    NotConnected(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors that mean the slot's tokens are dead and the user
    /// must reconnect (as opposed to transient provider trouble).
    pub fn is_token_error(&self) -> bool {
        matches!(self, AppError::Refresh(_) | AppError::NotConnected(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state", None),
            AppError::TokenExchange(msg) => {
                (StatusCode::BAD_GATEWAY, "token_exchange", Some(msg.clone()))
            }
            AppError::Refresh(msg) => {
                (StatusCode::BAD_GATEWAY, "refresh_failed", Some(msg.clone()))
            }
            AppError::RateLimited { provider } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                Some(provider.to_string()),
            ),
            AppError::ScopeOrSubscription(msg) => (
                StatusCode::FORBIDDEN,
                "scope_or_subscription",
                Some(msg.clone()),
            ),
            AppError::Transport(msg) => (StatusCode::BAD_GATEWAY, "transport", Some(msg.clone())),
            AppError::NotConnected(slot) => {
                (StatusCode::NOT_FOUND, "not_connected", Some(slot.clone()))
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Token storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
