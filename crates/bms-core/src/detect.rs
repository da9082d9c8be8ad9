//! Fault detection from raw sensor readings
//!
//! A reading is checked against the limits for its sensor kind and turned
//! into a [`FaultFlags`] value. [`FaultDetector`] then splits the flags per
//! device kind and assigns a severity, producing the faults to store.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flags::{fault_bit, FaultFlags};
use crate::models::{NewFault, SensorKind, SensorReading};

/// Limits used by fault detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionThresholds {
    /// Temperature above this is `TEMP_HIGH` (°C)
    pub temp_high: f64,
    /// Humidity above this is `HUM_HIGH` (%)
    pub humidity_high: f64,
    /// CO2 below this is `CO2_LOW` (ppm)
    pub co2_low: f64,
    /// CO2 above this is `CO2_HIGH` (ppm)
    pub co2_high: f64,
    /// Power above this is `POWER_SPIKE` (kW)
    pub power_spike_kw: f64,
    /// Presence value a sensor reports when it cannot read
    pub presence_error_value: i32,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            temp_high: 35.0,
            humidity_high: 60.0,
            co2_low: 200.0,
            co2_high: 800.0,
            power_spike_kw: 45.0,
            presence_error_value: 3,
        }
    }
}

/// Detect faults in a reading using the default limits
pub fn detect(reading: &SensorReading) -> FaultFlags {
    detect_with(reading, &DetectionThresholds::default())
}

/// Detect faults in a reading.
///
/// Only the metrics belonging to the reading's sensor kind are checked. For
/// IAQ sensors a missing metric counts as zero; a zero in every metric means
/// the sensor is dead, a zero in some of them means it needs calibration, and
/// in both cases the limit checks are skipped. Missing power or presence
/// values report nothing.
pub fn detect_with(reading: &SensorReading, limits: &DetectionThresholds) -> FaultFlags {
    let mut flags = FaultFlags::NONE;

    match reading.sensor_type {
        SensorKind::Iaq => {
            let temperature = reading.temperature.unwrap_or(0.0);
            let humidity = reading.humidity.unwrap_or(0.0);
            let co2 = reading.co2.unwrap_or(0.0);

            let zeros = [temperature, humidity, co2]
                .iter()
                .filter(|v| **v == 0.0)
                .count();
            if zeros == 3 {
                return FaultFlags::new(fault_bit::SENSOR_NOT_WORKING);
            }
            if zeros > 0 {
                return FaultFlags::new(fault_bit::CALIBRATION_ERROR);
            }

            if temperature > limits.temp_high {
                flags |= fault_bit::TEMP_HIGH;
            }
            if humidity > limits.humidity_high {
                flags |= fault_bit::HUM_HIGH;
            }
            if co2 < limits.co2_low {
                flags |= fault_bit::CO2_LOW;
            }
            if co2 > limits.co2_high {
                flags |= fault_bit::CO2_HIGH;
            }
        }
        SensorKind::Power => {
            if let Some(power) = reading.power {
                if power == 0.0 {
                    flags |= fault_bit::POWER_NOT_WORKING;
                }
                if power > limits.power_spike_kw {
                    flags |= fault_bit::POWER_SPIKE;
                }
            }
        }
        SensorKind::Presence => {
            if reading.presence == Some(limits.presence_error_value) {
                flags |= fault_bit::PRESENCE_NOT_READING;
            }
        }
    }

    flags
}

/// Severity of a single fault bit
fn bit_severity(bit: u32) -> i32 {
    match bit {
        fault_bit::CO2_LOW => 1,
        fault_bit::POWER_NOT_WORKING | fault_bit::POWER_SPIKE => 3,
        _ => 2,
    }
}

/// Severity for a set of flags: the highest severity of any set bit, 1 when
/// nothing is set
pub fn severity_for(flags: FaultFlags) -> i32 {
    flags
        .types()
        .map(|t| bit_severity(t.value))
        .max()
        .unwrap_or(1)
}

/// Split flags into the parts each device kind reports.
///
/// Parts come in `iaq`, `power`, `presence` order; empty parts are skipped.
pub fn split_by_device(flags: FaultFlags) -> Vec<(SensorKind, FaultFlags)> {
    SensorKind::ALL
        .iter()
        .map(|kind| (*kind, flags.masked(kind.fault_mask())))
        .filter(|(_, part)| !part.is_empty())
        .collect()
}

/// Turns readings into faults ready to be stored
#[derive(Debug, Clone, Default)]
pub struct FaultDetector {
    limits: DetectionThresholds,
}

impl FaultDetector {
    pub fn new(limits: DetectionThresholds) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &DetectionThresholds {
        &self.limits
    }

    /// Flags detected in a reading
    pub fn detect(&self, reading: &SensorReading) -> FaultFlags {
        detect_with(reading, &self.limits)
    }

    /// One new fault per device part of the detected flags
    pub fn evaluate(&self, reading: &SensorReading) -> Vec<NewFault> {
        let flags = self.detect(reading);
        if flags.is_empty() {
            return Vec::new();
        }

        debug!(
            sensor_id = reading.sensor_id,
            floor = reading.floor,
            room = reading.room,
            flags = %flags,
            "Fault detected"
        );

        split_by_device(flags)
            .into_iter()
            .map(|(kind, part)| NewFault {
                device_type: kind.as_str().to_string(),
                fault_flags: part,
                floor: reading.floor,
                room: reading.room,
                severity: severity_for(part),
                time: reading.time,
            })
            .collect()
    }
}
