// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Twin-Monitor API Server
//!
//! Connects two Oura Ring (and optionally Polar) accounts over OAuth2 and
//! serves comparative daily metric series to the dashboard frontend.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twin_monitor::{
    config::Config,
    services::{DashboardService, MetricPoller, OAuthClient},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        providers = ?config.enabled_providers(),
        "Starting Twin-Monitor API"
    );

    // Select the token store backend (STORAGE_BUCKET_NAME => cloud)
    let store = twin_monitor::store::from_config(&config)
        .await
        .expect("Failed to initialize token store");

    // OAuth client and poller share the store
    let oauth = OAuthClient::new(config.clone());
    let poller = MetricPoller::new(oauth.clone(), store.clone());
    let dashboard = DashboardService::new(poller, config.enabled_providers());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        oauth,
        dashboard,
    });

    // Build router
    let app = twin_monitor::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("twin_monitor=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
