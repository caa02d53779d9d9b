// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and cached in memory. A `.env` file is
//! honored for local development.

use crate::models::Provider;
use std::env;
use std::path::PathBuf;

/// OAuth app credentials for one provider (shared by both twin slots).
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Oura OAuth app (required)
    pub oura: ProviderCredentials,
    /// Polar OAuth app (optional; absent disables the provider)
    pub polar: Option<ProviderCredentials>,

    /// Dashboard login credentials
    pub authorized_user: String,
    pub authorized_password: String,

    /// JWT signing key for session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,

    /// Cloud token store: set selects the Firestore backend and names the
    /// token collection; absent selects the local-file backend.
    pub storage_bucket_name: Option<String>,
    /// GCP project for the cloud backend
    pub gcp_project_id: String,
    /// Directory for the local-file backend
    pub token_dir: PathBuf,

    /// Frontend URL for post-OAuth redirects and CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let session_signing_key = env::var("SESSION_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
            .into_bytes();

        // A dedicated state key is optional; the session key is reused when
        // it is not set.
        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| session_signing_key.clone());

        Ok(Self {
            oura: ProviderCredentials {
                client_id: env::var("OURA_CLIENT_ID")
                    .map_err(|_| ConfigError::Missing("OURA_CLIENT_ID"))?,
                client_secret: env::var("OURA_CLIENT_SECRET")
                    .map(|v| v.trim().to_string())
                    .map_err(|_| ConfigError::Missing("OURA_CLIENT_SECRET"))?,
                redirect_uri: env::var("OURA_REDIRECT_URI")
                    .map_err(|_| ConfigError::Missing("OURA_REDIRECT_URI"))?,
            },
            polar: Self::polar_from_env()?,

            authorized_user: env::var("AUTHORIZED_USER")
                .map_err(|_| ConfigError::Missing("AUTHORIZED_USER"))?,
            authorized_password: env::var("AUTHORIZED_PASSWORD")
                .map_err(|_| ConfigError::Missing("AUTHORIZED_PASSWORD"))?,

            session_signing_key,
            oauth_state_key,

            storage_bucket_name: env::var("STORAGE_BUCKET_NAME").ok(),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            token_dir: env::var("TOKEN_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".tokens")),

            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }

    /// Polar is enabled only when all three variables are present; a partial
    /// set is a configuration mistake rather than "disabled".
    fn polar_from_env() -> Result<Option<ProviderCredentials>, ConfigError> {
        let id = env::var("POLAR_CLIENT_ID").ok();
        let secret = env::var("POLAR_CLIENT_SECRET").ok();
        let redirect = env::var("POLAR_REDIRECT_URI").ok();

        match (id, secret, redirect) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => {
                Ok(Some(ProviderCredentials {
                    client_id,
                    client_secret: client_secret.trim().to_string(),
                    redirect_uri,
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::PartialProvider("POLAR")),
        }
    }

    /// Credentials for a provider, if it is configured.
    pub fn credentials_for(&self, provider: Provider) -> Option<&ProviderCredentials> {
        match provider {
            Provider::Oura => Some(&self.oura),
            Provider::Polar => self.polar.as_ref(),
        }
    }

    /// Providers enabled by this configuration.
    pub fn enabled_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.credentials_for(*p).is_some())
            .collect()
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            oura: ProviderCredentials {
                client_id: "test_oura_id".to_string(),
                client_secret: "test_oura_secret".to_string(),
                redirect_uri: "http://localhost:8080/auth/callback/oura".to_string(),
            },
            polar: None,
            authorized_user: "doctor".to_string(),
            authorized_password: "expedition".to_string(),
            session_signing_key: b"test_session_key_32_bytes_long!!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
            storage_bucket_name: None,
            gcp_project_id: "test-project".to_string(),
            token_dir: PathBuf::from(".tokens"),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Incomplete {0}_* credentials: set all of CLIENT_ID, CLIENT_SECRET and REDIRECT_URI or none")]
    PartialProvider(&'static str),
}
