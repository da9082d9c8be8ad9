//! Sensor reading and connectivity models

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::flags::fault_bit;

/// Default time after which a silent sensor is reported offline
pub const DEFAULT_OFFLINE_THRESHOLD_SECS: i64 = 5 * 60;

/// Kind of sensor device installed in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Indoor air quality: temperature, humidity and CO2 in one reading
    Iaq,
    /// Power meter (kW)
    Power,
    /// Presence sensor (0 none, 1 partial, 2 full, 3 error)
    Presence,
}

impl SensorKind {
    /// All kinds, in fault bit order
    pub const ALL: [SensorKind; 3] = [SensorKind::Iaq, SensorKind::Power, SensorKind::Presence];

    /// Device type string stored on fault records
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Iaq => "iaq",
            SensorKind::Power => "power",
            SensorKind::Presence => "presence",
        }
    }

    /// Fault bits this kind of device can report
    pub fn fault_mask(&self) -> u32 {
        match self {
            SensorKind::Iaq => fault_bit::IAQ_MASK,
            SensorKind::Power => fault_bit::POWER_MASK,
            SensorKind::Presence => fault_bit::PRESENCE_MASK,
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iaq" => Ok(SensorKind::Iaq),
            "power" => Ok(SensorKind::Power),
            "presence" => Ok(SensorKind::Presence),
            _ => Err(format!("Unknown sensor type: '{}'", s)),
        }
    }
}

/// A stored sensor reading. Metrics a device does not report stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: i64,
    pub time: DateTime<Utc>,
    pub sensor_id: i64,
    pub sensor_type: SensorKind,
    pub floor: i32,
    pub room: i32,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub presence: Option<i32>,
}

/// A reading about to be stored (id assigned by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    /// Measurement time; the store uses "now" when absent
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    pub sensor_id: i64,
    pub sensor_type: SensorKind,
    pub floor: i32,
    pub room: i32,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub presence: Option<i32>,
}

impl NewReading {
    /// Attach an id and a time, producing the stored form
    pub fn into_reading(self, id: i64, now: DateTime<Utc>) -> SensorReading {
        SensorReading {
            id,
            time: self.time.unwrap_or(now),
            sensor_id: self.sensor_id,
            sensor_type: self.sensor_type,
            floor: self.floor,
            room: self.room,
            temperature: self.temperature,
            humidity: self.humidity,
            co2: self.co2,
            power: self.power,
            presence: self.presence,
        }
    }
}

/// Filter for querying readings (results in chronological order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadingFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<SensorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Keep only the newest N matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ReadingFilter {
    pub fn matches(&self, reading: &SensorReading) -> bool {
        self.floor.map_or(true, |f| reading.floor == f)
            && self.room.map_or(true, |r| reading.room == r)
            && self.sensor_type.map_or(true, |t| reading.sensor_type == t)
            && self.since.map_or(true, |s| reading.time >= s)
            && self.until.map_or(true, |u| reading.time <= u)
    }
}

/// Connectivity state derived from the last reading time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
}

/// Latest known state of one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorStatus {
    pub sensor_id: i64,
    pub sensor_type: SensorKind,
    pub floor: i32,
    pub room: i32,
    pub last_seen: DateTime<Utc>,
    pub status: Connectivity,
}

/// Online/offline totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOverview {
    pub online: usize,
    pub offline: usize,
    pub total: usize,
}

impl StatusOverview {
    pub fn from_statuses(statuses: &[SensorStatus]) -> Self {
        let online = statuses
            .iter()
            .filter(|s| s.status == Connectivity::Online)
            .count();
        Self {
            online,
            offline: statuses.len() - online,
            total: statuses.len(),
        }
    }
}

/// Derive one status per sensor from its most recent reading.
///
/// A sensor is online when its last reading is newer than `now - threshold`.
/// Results are ordered by `last_seen`, newest first, then by sensor id.
pub fn sensor_statuses(
    readings: &[SensorReading],
    now: DateTime<Utc>,
    threshold: Duration,
) -> Vec<SensorStatus> {
    let cutoff = now - threshold;
    let mut latest: HashMap<i64, &SensorReading> = HashMap::new();

    for reading in readings {
        latest
            .entry(reading.sensor_id)
            .and_modify(|current| {
                if reading.time > current.time {
                    *current = reading;
                }
            })
            .or_insert(reading);
    }

    let mut statuses: Vec<SensorStatus> = latest
        .into_values()
        .map(|r| SensorStatus {
            sensor_id: r.sensor_id,
            sensor_type: r.sensor_type,
            floor: r.floor,
            room: r.room,
            last_seen: r.time,
            status: if r.time > cutoff {
                Connectivity::Online
            } else {
                Connectivity::Offline
            },
        })
        .collect();

    statuses.sort_by(|a, b| {
        b.last_seen
            .cmp(&a.last_seen)
            .then(a.sensor_id.cmp(&b.sensor_id))
    });
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(sensor_id: i64, minutes_ago: i64, now: DateTime<Utc>) -> SensorReading {
        SensorReading {
            id: sensor_id * 100 + minutes_ago,
            time: now - Duration::minutes(minutes_ago),
            sensor_id,
            sensor_type: SensorKind::Iaq,
            floor: 1,
            room: sensor_id as i32,
            temperature: Some(24.0),
            humidity: Some(45.0),
            co2: Some(500.0),
            power: None,
            presence: None,
        }
    }

    #[test]
    fn test_sensor_kind_masks_cover_all_bits() {
        let combined = SensorKind::ALL
            .iter()
            .fold(0, |acc, kind| acc | kind.fault_mask());
        assert_eq!(combined, fault_bit::ALL_MASK);
        assert_eq!("power".parse::<SensorKind>().unwrap(), SensorKind::Power);
        assert!("hvac".parse::<SensorKind>().is_err());
    }

    #[test]
    fn test_statuses_use_latest_reading() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let readings = vec![
            reading(1, 20, now),
            reading(1, 2, now),
            reading(2, 10, now),
        ];
        let statuses = sensor_statuses(&readings, now, Duration::minutes(5));

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].sensor_id, 1);
        assert_eq!(statuses[0].status, Connectivity::Online);
        assert_eq!(statuses[0].last_seen, now - Duration::minutes(2));
        assert_eq!(statuses[1].sensor_id, 2);
        assert_eq!(statuses[1].status, Connectivity::Offline);

        let overview = StatusOverview::from_statuses(&statuses);
        assert_eq!(
            overview,
            StatusOverview {
                online: 1,
                offline: 1,
                total: 2
            }
        );
    }

    #[test]
    fn test_reading_exactly_at_threshold_is_offline() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let statuses = sensor_statuses(&[reading(3, 5, now)], now, Duration::minutes(5));
        assert_eq!(statuses[0].status, Connectivity::Offline);
    }

    #[test]
    fn test_no_readings_no_statuses() {
        let statuses = sensor_statuses(&[], Utc::now(), Duration::minutes(5));
        assert!(statuses.is_empty());
        assert_eq!(StatusOverview::from_statuses(&statuses).total, 0);
    }

    #[test]
    fn test_new_reading_defaults_time() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let new: NewReading = serde_json::from_str(
            r#"{"sensor_id": 9, "sensor_type": "power", "floor": 2, "room": 4, "power": 12.5}"#,
        )
        .unwrap();
        let stored = new.into_reading(1, now);
        assert_eq!(stored.time, now);
        assert_eq!(stored.power, Some(12.5));
        assert_eq!(stored.temperature, None);
    }

    #[test]
    fn test_reading_filter() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let r = reading(2, 10, now);
        let filter = ReadingFilter {
            floor: Some(1),
            room: Some(2),
            since: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        assert!(filter.matches(&r));
        let other_kind = ReadingFilter {
            sensor_type: Some(SensorKind::Power),
            ..Default::default()
        };
        assert!(!other_kind.matches(&r));
    }
}
