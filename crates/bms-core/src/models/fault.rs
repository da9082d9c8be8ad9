//! Equipment fault models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::flags::{self, FaultFlags};

/// One detected equipment or sensor problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultRecord {
    /// Unique identifier
    pub id: i64,
    /// Device category (e.g. "iaq", "power"), free text
    pub device_type: String,
    /// Fault bitmask as stored
    pub fault_flags: i64,
    /// Floor number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    /// Room number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<i32>,
    /// Severity (1-3)
    pub severity: i32,
    /// When the fault was detected
    pub time: DateTime<Utc>,
    /// `None` or `Some(false)` while the fault is active
    #[serde(default)]
    pub resolved: Option<bool>,
    /// When an operator resolved the fault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl FaultRecord {
    /// True when the fault has been resolved
    pub fn is_resolved(&self) -> bool {
        self.resolved.unwrap_or(false)
    }

    /// True while the fault has not been resolved
    pub fn is_active(&self) -> bool {
        !self.is_resolved()
    }

    /// Defined fault bits of this record
    pub fn flags(&self) -> FaultFlags {
        FaultFlags::from_raw(self.fault_flags)
    }

    /// Descriptions of the reported conditions
    pub fn descriptions(&self) -> Vec<&'static str> {
        flags::decode(self.fault_flags)
    }

    /// "Floor {floor}, Room {room}", or `None` when either is missing
    pub fn location(&self) -> Option<String> {
        match (self.floor, self.room) {
            (Some(floor), Some(room)) => Some(format!("Floor {}, Room {}", floor, room)),
            _ => None,
        }
    }
}

/// A fault about to be stored (id assigned by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFault {
    pub device_type: String,
    pub fault_flags: FaultFlags,
    pub floor: i32,
    pub room: i32,
    pub severity: i32,
    pub time: DateTime<Utc>,
}

/// Filter for querying faults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultFilter {
    /// Only faults on this floor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    /// Only faults in this room
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<i32>,
    /// Only this device type (exact match)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Faults at or after this time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Faults at or before this time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Only resolved (`true`) or only active (`false`) faults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<bool>,
    /// Maximum number of faults to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl FaultFilter {
    /// Unresolved faults only
    pub fn active() -> Self {
        Self {
            resolved: Some(false),
            ..Default::default()
        }
    }

    /// Check a record against every condition except `limit`
    pub fn matches(&self, fault: &FaultRecord) -> bool {
        if self.floor.is_some() && fault.floor != self.floor {
            return false;
        }
        if self.room.is_some() && fault.room != self.room {
            return false;
        }
        if let Some(ref device_type) = self.device_type {
            if &fault.device_type != device_type {
                return false;
            }
        }
        if let Some(since) = self.since {
            if fault.time < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if fault.time > until {
                return false;
            }
        }
        if let Some(resolved) = self.resolved {
            if fault.is_resolved() != resolved {
                return false;
            }
        }
        true
    }
}

/// Analysis time window, relative to "now"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "30min")]
    Last30Minutes,
    #[serde(rename = "1hour")]
    LastHour,
    #[serde(rename = "6hours")]
    Last6Hours,
    #[default]
    #[serde(rename = "1day")]
    LastDay,
    #[serde(rename = "1week")]
    LastWeek,
}

impl TimeWindow {
    /// Length of the window in minutes
    pub fn minutes(&self) -> i64 {
        match self {
            TimeWindow::Last30Minutes => 30,
            TimeWindow::LastHour => 60,
            TimeWindow::Last6Hours => 6 * 60,
            TimeWindow::LastDay => 24 * 60,
            TimeWindow::LastWeek => 7 * 24 * 60,
        }
    }

    /// Earliest time included in the window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::minutes(self.minutes())
    }

    /// Operator-facing description (e.g. "last hour")
    pub fn description(&self) -> &'static str {
        match self {
            TimeWindow::Last30Minutes => "last 30 minutes",
            TimeWindow::LastHour => "last hour",
            TimeWindow::Last6Hours => "last 6 hours",
            TimeWindow::LastDay => "last 24 hours",
            TimeWindow::LastWeek => "last 7 days",
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimeWindow::Last30Minutes => "30min",
            TimeWindow::LastHour => "1hour",
            TimeWindow::Last6Hours => "6hours",
            TimeWindow::LastDay => "1day",
            TimeWindow::LastWeek => "1week",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30min" => Ok(TimeWindow::Last30Minutes),
            "1hour" => Ok(TimeWindow::LastHour),
            "6hours" => Ok(TimeWindow::Last6Hours),
            "1day" => Ok(TimeWindow::LastDay),
            "1week" => Ok(TimeWindow::LastWeek),
            _ => Err(format!(
                "Unknown time range: '{}' (use 30min, 1hour, 6hours, 1day or 1week)",
                s
            )),
        }
    }
}

/// Range for fault trend buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendRange {
    #[serde(rename = "30m")]
    HalfHour,
    #[default]
    #[serde(rename = "1h")]
    Hour,
    #[serde(rename = "1d")]
    Day,
}

impl TrendRange {
    /// Width of one bucket
    pub fn bucket(&self) -> Duration {
        match self {
            TrendRange::HalfHour => Duration::minutes(2),
            TrendRange::Hour => Duration::minutes(5),
            TrendRange::Day => Duration::hours(1),
        }
    }

    /// Total span covered
    pub fn span(&self) -> Duration {
        match self {
            TrendRange::HalfHour => Duration::minutes(30),
            TrendRange::Hour => Duration::hours(1),
            TrendRange::Day => Duration::days(1),
        }
    }
}

impl std::str::FromStr for TrendRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "30m" => Ok(TrendRange::HalfHour),
            "1h" => Ok(TrendRange::Hour),
            "1d" => Ok(TrendRange::Day),
            _ => Err("Invalid range. Use '1h', '30m', or '1d'".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fault(id: i64, floor: Option<i32>, room: Option<i32>) -> FaultRecord {
        FaultRecord {
            id,
            device_type: "iaq".to_string(),
            fault_flags: 4,
            floor,
            room,
            severity: 2,
            time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            resolved: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_active_treats_null_as_unresolved() {
        let mut f = fault(1, Some(1), Some(2));
        assert!(f.is_active());
        f.resolved = Some(false);
        assert!(f.is_active());
        f.resolved = Some(true);
        assert!(f.is_resolved());
    }

    #[test]
    fn test_location_requires_floor_and_room() {
        assert_eq!(
            fault(1, Some(1), Some(2)).location().as_deref(),
            Some("Floor 1, Room 2")
        );
        assert_eq!(fault(1, None, Some(2)).location(), None);
        assert_eq!(fault(1, Some(1), None).location(), None);
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let json = r#"{
            "id": 7,
            "device_type": "power",
            "fault_flags": 128,
            "floor": 3,
            "room": 1,
            "severity": 3,
            "time": "2024-05-01T12:00:00Z"
        }"#;
        let record: FaultRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.resolved, None);
        assert!(record.is_active());
        assert_eq!(record.descriptions(), vec!["Power spike detected"]);
    }

    #[test]
    fn test_filter_matches() {
        let f = fault(1, Some(2), Some(3));
        let mut filter = FaultFilter {
            floor: Some(2),
            ..Default::default()
        };
        assert!(filter.matches(&f));
        filter.room = Some(4);
        assert!(!filter.matches(&f));

        let active = FaultFilter::active();
        assert!(active.matches(&f));

        let since = FaultFilter {
            since: Some(f.time + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!since.matches(&f));

        let device = FaultFilter {
            device_type: Some("IAQ".to_string()),
            ..Default::default()
        };
        assert!(!device.matches(&f));
    }

    #[test]
    fn test_time_window_parse_and_cutoff() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window: TimeWindow = "1hour".parse().unwrap();
        assert_eq!(window, TimeWindow::LastHour);
        assert_eq!(window.cutoff(now), now - Duration::hours(1));
        assert_eq!(window.to_string(), "1hour");
        assert!("2hours".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn test_trend_range_parse() {
        assert_eq!("30m".parse::<TrendRange>().unwrap().bucket(), Duration::minutes(2));
        assert_eq!("1d".parse::<TrendRange>().unwrap().span(), Duration::days(1));
        assert!("1w".parse::<TrendRange>().is_err());
    }
}
