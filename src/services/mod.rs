// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod dashboard;
pub mod oauth;
pub mod poller;

pub use dashboard::{DashboardData, DashboardService, SlotData, TwinData};
pub use oauth::OAuthClient;
pub use poller::{MetricPoller, RateBudget};
