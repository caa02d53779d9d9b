// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Twin-Monitor: comparative biometric dashboard for two subjects
//!
//! This crate provides the backend API for connecting two Oura Ring (and
//! optionally Polar) accounts over OAuth2 and assembling their daily metric
//! series for side-by-side charting.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use services::{DashboardService, OAuthClient};
use std::sync::Arc;
use store::TokenStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TokenStore>,
    pub oauth: OAuthClient,
    pub dashboard: DashboardService,
}
