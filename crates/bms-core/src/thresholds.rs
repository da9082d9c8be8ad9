//! Normal operating ranges for room metrics
//!
//! These are comfort ranges used to highlight readings on the analysis view.
//! They are wider than "no fault" and independent of fault detection.

use serde::{Deserialize, Serialize};

use crate::models::SensorReading;

/// A metric carried by sensor readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Humidity,
    Co2,
    Presence,
    Power,
}

/// Inclusive normal range for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Co2,
        Metric::Presence,
        Metric::Power,
    ];

    pub fn normal_range(&self) -> NormalRange {
        let (min, max) = match self {
            Metric::Temperature => (18.0, 28.0),
            Metric::Humidity => (30.0, 60.0),
            Metric::Co2 => (400.0, 1000.0),
            Metric::Presence => (0.0, 2.0),
            Metric::Power => (0.0, 100.0),
        };
        NormalRange { min, max }
    }

    /// Value of this metric in a reading, if reported
    pub fn value(&self, reading: &SensorReading) -> Option<f64> {
        match self {
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
            Metric::Co2 => reading.co2,
            Metric::Presence => reading.presence.map(f64::from),
            Metric::Power => reading.power,
        }
    }

    fn out_of_range_message(&self, value: f64) -> String {
        let r = self.normal_range();
        match self {
            Metric::Temperature => format!(
                "Temperature out of range: {}°C (normal range: {}-{}°C)",
                value, r.min, r.max
            ),
            Metric::Humidity => format!(
                "Humidity out of range: {}% (normal range: {}-{}%)",
                value, r.min, r.max
            ),
            Metric::Co2 => format!(
                "CO2 out of range: {} ppm (normal range: {}-{} ppm)",
                value, r.min, r.max
            ),
            Metric::Presence => format!(
                "Presence value invalid: {} (valid values: {}-{})",
                value, r.min, r.max
            ),
            Metric::Power => format!(
                "Power out of range: {}% (normal range: {}-{}%)",
                value, r.min, r.max
            ),
        }
    }
}

/// A metric value outside its normal range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub metric: Metric,
    pub value: f64,
    pub message: String,
}

/// Check every reported metric of a reading. Absent metrics are skipped.
pub fn annotate(reading: &SensorReading) -> Vec<RangeViolation> {
    Metric::ALL
        .iter()
        .filter_map(|metric| {
            let value = metric.value(reading)?;
            if metric.normal_range().contains(value) {
                return None;
            }
            Some(RangeViolation {
                metric: *metric,
                value,
                message: metric.out_of_range_message(value),
            })
        })
        .collect()
}

/// A reading together with its range violations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedReading {
    #[serde(flatten)]
    pub reading: SensorReading,
    pub violations: Vec<RangeViolation>,
}

impl From<SensorReading> for AnnotatedReading {
    fn from(reading: SensorReading) -> Self {
        let violations = annotate(&reading);
        Self {
            reading,
            violations,
        }
    }
}
