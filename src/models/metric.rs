// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric definitions and fetched samples.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A daily biometric metric tracked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[serde(rename = "spo2")]
    SpO2,
    RestingHeartRate,
    Hrv,
    RespiratoryRate,
    SleepScore,
    WorkoutHeartRate,
    TrainingLoad,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SpO2 => "spo2",
            Metric::RestingHeartRate => "resting_heart_rate",
            Metric::Hrv => "hrv",
            Metric::RespiratoryRate => "respiratory_rate",
            Metric::SleepScore => "sleep_score",
            Metric::WorkoutHeartRate => "workout_heart_rate",
            Metric::TrainingLoad => "training_load",
        }
    }

    /// Display unit, if the metric has one.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Metric::SpO2 => Some("%"),
            Metric::RestingHeartRate | Metric::WorkoutHeartRate => Some("bpm"),
            Metric::Hrv => Some("ms"),
            Metric::RespiratoryRate => Some("br/min"),
            Metric::SleepScore | Metric::TrainingLoad => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reading for one date and one metric.
///
/// Immutable once fetched; never persisted — recomputed each session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Calendar day the reading belongs to
    pub day: NaiveDate,
    pub value: f64,
}

/// A date-ordered series of samples for one metric on one slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSeries {
    pub metric: Metric,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub samples: Vec<MetricSample>,
}

impl MetricSeries {
    pub fn new(metric: Metric, samples: Vec<MetricSample>) -> Self {
        Self {
            metric,
            unit: metric.unit().map(str::to_string),
            samples,
        }
    }
}
