// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod metric;
pub mod slot;
pub mod token;

pub use metric::{Metric, MetricSample, MetricSeries};
pub use slot::{AccountSlot, Provider, TwinId};
pub use token::TokenRecord;
