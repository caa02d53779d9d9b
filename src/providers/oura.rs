// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Oura Ring API v2 row shapes.
//!
//! Daily metrics come from three usercollection endpoints: `daily_spo2`,
//! `sleep` (resting HR, HRV, respiratory rate) and `daily_sleep` (score).

use crate::models::{Metric, MetricSample};
use chrono::NaiveDate;
use serde::Deserialize;

pub fn endpoint_path(metric: Metric) -> Option<&'static str> {
    match metric {
        Metric::SpO2 => Some("/usercollection/daily_spo2"),
        Metric::RestingHeartRate | Metric::Hrv | Metric::RespiratoryRate => {
            Some("/usercollection/sleep")
        }
        Metric::SleepScore => Some("/usercollection/daily_sleep"),
        Metric::WorkoutHeartRate | Metric::TrainingLoad => None,
    }
}

/// Row of `/usercollection/daily_spo2`.
#[derive(Debug, Deserialize)]
struct DailySpo2Row {
    day: NaiveDate,
    spo2_percentage: Option<Spo2Percentage>,
}

#[derive(Debug, Deserialize)]
struct Spo2Percentage {
    average: Option<f64>,
}

/// Row of `/usercollection/sleep` (one per sleep period).
#[derive(Debug, Deserialize)]
struct SleepRow {
    day: NaiveDate,
    lowest_heart_rate: Option<f64>,
    average_hrv: Option<f64>,
    average_breath: Option<f64>,
}

/// Row of `/usercollection/daily_sleep`.
#[derive(Debug, Deserialize)]
struct DailySleepRow {
    day: NaiveDate,
    score: Option<f64>,
}

pub fn sample_from_row(metric: Metric, row: &serde_json::Value) -> Option<MetricSample> {
    match metric {
        Metric::SpO2 => {
            let row: DailySpo2Row = serde_json::from_value(row.clone()).ok()?;
            let value = row.spo2_percentage?.average?;
            Some(MetricSample {
                day: row.day,
                value,
            })
        }
        Metric::RestingHeartRate | Metric::Hrv | Metric::RespiratoryRate => {
            let parsed: SleepRow = serde_json::from_value(row.clone()).ok()?;
            let value = match metric {
                Metric::RestingHeartRate => parsed.lowest_heart_rate?,
                Metric::Hrv => parsed.average_hrv?,
                // Converted from breaths/second by the ring firmware already;
                // the API reports breaths/minute.
                Metric::RespiratoryRate => parsed.average_breath?,
                _ => unreachable!(),
            };
            Some(MetricSample {
                day: parsed.day,
                value,
            })
        }
        Metric::SleepScore => {
            let row: DailySleepRow = serde_json::from_value(row.clone()).ok()?;
            let value = row.score?;
            Some(MetricSample {
                day: row.day,
                value,
            })
        }
        Metric::WorkoutHeartRate | Metric::TrainingLoad => None,
    }
}
