//! Fault statistics over a set of fault records
//!
//! Every function here is a pure recomputation over the slice it is given.
//! Callers select the time window (usually with a [`FaultFilter`]) and pass
//! the matching records; nothing is cached between calls.
//!
//! [`FaultFilter`]: crate::models::FaultFilter

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::flags;
use crate::models::{FaultRecord, TrendRange};

/// Number of entries kept by the "top" rankings
pub const TOP_N: usize = 5;

/// A group name with its record count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A fault description with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionCount {
    #[serde(rename = "type")]
    pub fault_type: String,
    pub count: usize,
}

/// Count keys, keeping the order in which each key first appeared
fn count_in_order<I>(keys: I) -> Vec<NamedCount>
where
    I: IntoIterator,
    I::Item: Into<String> + AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<NamedCount> = Vec::new();

    for key in keys {
        match index.get(key.as_ref()) {
            Some(&i) => counts[i].value += 1,
            None => {
                let name: String = key.into();
                index.insert(name.clone(), counts.len());
                counts.push(NamedCount::new(name, 1));
            }
        }
    }

    counts
}

/// Sort descending by count (ties keep their order) and keep the top N
fn rank(mut counts: Vec<NamedCount>) -> Vec<NamedCount> {
    counts.sort_by(|a, b| b.value.cmp(&a.value));
    counts.truncate(TOP_N);
    counts
}

/// Number of faults per device type, in first-occurrence order
pub fn count_by_device_type(faults: &[FaultRecord]) -> Vec<NamedCount> {
    count_in_order(faults.iter().map(|f| f.device_type.as_str()))
}

/// Label used when grouping by severity.
///
/// The mapping is 1 → "Low", 2 → "Medium", anything else → "High". This is
/// the opposite of the dashboard colouring, which renders severity 1 as the
/// most alarming; the labels are kept as the operators know them.
pub fn severity_label(severity: i32) -> &'static str {
    match severity {
        1 => "Low",
        2 => "Medium",
        _ => "High",
    }
}

/// Number of faults per severity label, in first-occurrence order
pub fn count_by_severity(faults: &[FaultRecord]) -> Vec<NamedCount> {
    count_in_order(faults.iter().map(|f| severity_label(f.severity)))
}

/// The five locations with the most faults.
///
/// Records without a floor or room are left out.
pub fn top_locations(faults: &[FaultRecord]) -> Vec<NamedCount> {
    rank(count_in_order(faults.iter().filter_map(FaultRecord::location)))
}

/// Number of unresolved faults
pub fn active_count(faults: &[FaultRecord]) -> usize {
    faults.iter().filter(|f| f.is_active()).count()
}

/// Percentage of resolved faults, rounded half up; 0 for an empty set
pub fn resolution_rate(faults: &[FaultRecord]) -> u32 {
    let total = faults.len();
    if total == 0 {
        return 0;
    }
    let resolved = faults.iter().filter(|f| f.is_resolved()).count();
    ((200 * resolved + total) / (2 * total)) as u32
}

/// The five most frequent fault descriptions.
///
/// Each set bit of each record counts once, so a record reporting three
/// conditions contributes to three descriptions.
pub fn top_fault_descriptions(faults: &[FaultRecord]) -> Vec<DescriptionCount> {
    let descriptions = faults
        .iter()
        .filter(|f| f.fault_flags != 0)
        .flat_map(|f| flags::decode(f.fault_flags));

    rank(count_in_order(descriptions))
        .into_iter()
        .map(|c| DescriptionCount {
            fault_type: c.name,
            count: c.value,
        })
        .collect()
}

/// Summary statistics for one set of fault records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub total: usize,
    pub active: usize,
    /// Resolved share in percent
    pub resolution_rate: u32,
    pub by_device_type: Vec<NamedCount>,
    pub by_severity: Vec<NamedCount>,
    pub top_locations: Vec<NamedCount>,
    pub top_fault_types: Vec<DescriptionCount>,
}

impl AggregateSummary {
    /// Compute every statistic from scratch
    pub fn compute(faults: &[FaultRecord]) -> Self {
        Self {
            total: faults.len(),
            active: active_count(faults),
            resolution_rate: resolution_rate(faults),
            by_device_type: count_by_device_type(faults),
            by_severity: count_by_severity(faults),
            top_locations: top_locations(faults),
            top_fault_types: top_fault_descriptions(faults),
        }
    }
}

/// Unresolved faults falling into one time bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// Bucket start, aligned to the Unix epoch
    pub bucket: DateTime<Utc>,
    pub fault_count: usize,
    /// Severity 1 faults
    pub urgent_count: usize,
    /// Severity 2 faults
    pub warning_count: usize,
}

/// Bucket unresolved faults from the last `range.span()`, newest bucket first.
///
/// Empty buckets are not reported.
pub fn fault_trend(faults: &[FaultRecord], now: DateTime<Utc>, range: TrendRange) -> Vec<TrendBucket> {
    let cutoff = now - range.span();
    let width = range.bucket().num_seconds();
    let mut buckets: BTreeMap<i64, TrendBucket> = BTreeMap::new();

    for fault in faults.iter().filter(|f| f.is_active() && f.time >= cutoff) {
        let offset = fault.time.timestamp().rem_euclid(width);
        let start = fault.time
            - Duration::seconds(offset)
            - Duration::nanoseconds(i64::from(fault.time.timestamp_subsec_nanos()));

        let entry = buckets
            .entry(start.timestamp())
            .or_insert_with(|| TrendBucket {
                bucket: start,
                fault_count: 0,
                urgent_count: 0,
                warning_count: 0,
            });
        entry.fault_count += 1;
        match fault.severity {
            1 => entry.urgent_count += 1,
            2 => entry.warning_count += 1,
            _ => {}
        }
    }

    buckets.into_values().rev().collect()
}
