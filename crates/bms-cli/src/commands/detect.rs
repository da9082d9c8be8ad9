//! Detect command - run fault detection on one reading

use anyhow::Result;
use bms_core::detect::{self, DetectionThresholds, FaultDetector};
use bms_core::{SensorKind, SensorReading};
use chrono::Utc;

use crate::output::{DetectionRow, OutputContext};

/// Metric values given on the command line
pub struct DetectArgs {
    pub kind: SensorKind,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
    pub power: Option<f64>,
    pub presence: Option<i32>,
}

impl DetectArgs {
    fn into_reading(self) -> SensorReading {
        SensorReading {
            id: 0,
            time: Utc::now(),
            sensor_id: 0,
            sensor_type: self.kind,
            floor: 0,
            room: 0,
            temperature: self.temperature,
            humidity: self.humidity,
            co2: self.co2,
            power: self.power,
            presence: self.presence,
        }
    }
}

/// Rows for each device part of the detected flags
pub fn detection_rows(reading: &SensorReading, detector: &FaultDetector) -> Vec<DetectionRow> {
    let flags = detector.detect(reading);
    detect::split_by_device(flags)
        .into_iter()
        .map(|(kind, part)| DetectionRow {
            device_type: kind.to_string(),
            fault_flags: part.bits(),
            names: part.names().join(", "),
            severity: detect::severity_for(part),
        })
        .collect()
}

/// Print the faults detected in a reading
pub fn detect(args: DetectArgs, limits: &DetectionThresholds, ctx: &OutputContext) -> Result<()> {
    let reading = args.into_reading();
    let detector = FaultDetector::new(limits.clone());
    let rows = detection_rows(&reading, &detector);

    if rows.is_empty() {
        ctx.success("No fault detected");
        return Ok(());
    }

    ctx.print(&rows);
    Ok(())
}
