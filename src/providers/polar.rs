// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polar AccessLink v3 row shapes.
//!
//! Nightly Recharge carries resting HR and HRV, the sleep endpoint carries
//! the sleep score, and exercises carry workout heart rate and training
//! load. Exercise rows are stamped with a start time rather than a day, so
//! the date is taken from its date component.

use crate::models::{Metric, MetricSample};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

pub fn endpoint_path(metric: Metric) -> Option<&'static str> {
    match metric {
        Metric::RestingHeartRate | Metric::Hrv => Some("/v3/users/nightly-recharge"),
        Metric::SleepScore => Some("/v3/users/sleep"),
        Metric::WorkoutHeartRate | Metric::TrainingLoad => Some("/v3/exercises"),
        Metric::SpO2 | Metric::RespiratoryRate => None,
    }
}

/// Row of `/v3/users/nightly-recharge`.
#[derive(Debug, Deserialize)]
struct NightlyRechargeRow {
    date: NaiveDate,
    heart_rate_avg: Option<f64>,
    heart_rate_variability_avg: Option<f64>,
}

/// Row of `/v3/users/sleep`.
#[derive(Debug, Deserialize)]
struct SleepRow {
    date: NaiveDate,
    sleep_score: Option<f64>,
}

/// Row of `/v3/exercises`.
#[derive(Debug, Deserialize)]
struct ExerciseRow {
    start_time: DateTime<FixedOffset>,
    heart_rate: Option<ExerciseHeartRate>,
    training_load: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExerciseHeartRate {
    average: Option<f64>,
}

pub fn sample_from_row(metric: Metric, row: &serde_json::Value) -> Option<MetricSample> {
    match metric {
        Metric::RestingHeartRate | Metric::Hrv => {
            let parsed: NightlyRechargeRow = serde_json::from_value(row.clone()).ok()?;
            let value = match metric {
                Metric::RestingHeartRate => parsed.heart_rate_avg?,
                Metric::Hrv => parsed.heart_rate_variability_avg?,
                _ => unreachable!(),
            };
            Some(MetricSample {
                day: parsed.date,
                value,
            })
        }
        Metric::SleepScore => {
            let row: SleepRow = serde_json::from_value(row.clone()).ok()?;
            let value = row.sleep_score?;
            Some(MetricSample {
                day: row.date,
                value,
            })
        }
        Metric::WorkoutHeartRate | Metric::TrainingLoad => {
            let parsed: ExerciseRow = serde_json::from_value(row.clone()).ok()?;
            let value = match metric {
                Metric::WorkoutHeartRate => parsed.heart_rate?.average?,
                Metric::TrainingLoad => parsed.training_load?,
                _ => unreachable!(),
            };
            Some(MetricSample {
                day: parsed.start_time.date_naive(),
                value,
            })
        }
        Metric::SpO2 | Metric::RespiratoryRate => None,
    }
}
