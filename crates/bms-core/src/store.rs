//! Fault and reading storage
//!
//! [`FaultStore`] is the data layer the API is served from. [`MemoryStore`]
//! keeps everything in process and publishes a [`ChangeEvent`] for every
//! mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::models::{FaultFilter, FaultRecord, NewFault, NewReading, ReadingFilter, SensorReading};

/// Rooms reported for a floor with no recorded faults
pub const DEFAULT_ROOMS: [i32; 5] = [1, 2, 3, 4, 5];

/// Notification published after a store mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChangeEvent {
    FaultInserted(FaultRecord),
    FaultResolved(FaultRecord),
    ReadingInserted(SensorReading),
}

impl ChangeEvent {
    /// Event name, as used for SSE event types
    pub fn name(&self) -> &'static str {
        match self {
            ChangeEvent::FaultInserted(_) => "fault_inserted",
            ChangeEvent::FaultResolved(_) => "fault_resolved",
            ChangeEvent::ReadingInserted(_) => "reading_inserted",
        }
    }
}

/// Storage for faults and sensor readings
#[async_trait]
pub trait FaultStore: Send + Sync {
    /// Faults matching a filter, newest first
    async fn list_faults(&self, filter: &FaultFilter) -> StoreResult<Vec<FaultRecord>>;

    /// A single fault by id
    async fn get_fault(&self, id: i64) -> StoreResult<FaultRecord>;

    /// Store a new, unresolved fault
    async fn insert_fault(&self, fault: NewFault) -> StoreResult<FaultRecord>;

    /// Mark a fault resolved. Resolving twice keeps the first `resolved_at`.
    async fn resolve_fault(&self, id: i64, at: DateTime<Utc>) -> StoreResult<FaultRecord>;

    /// Distinct rooms with faults on a floor, ascending; [`DEFAULT_ROOMS`]
    /// when there are none
    async fn rooms_on_floor(&self, floor: i32) -> StoreResult<Vec<i32>>;

    /// Newest unresolved fault in a room
    async fn latest_active_fault(&self, floor: i32, room: i32) -> StoreResult<Option<FaultRecord>>;

    /// Store a sensor reading, stamping it with `now` if it has no time
    async fn insert_reading(&self, reading: NewReading, now: DateTime<Utc>) -> StoreResult<SensorReading>;

    /// Readings matching a filter, oldest first
    async fn list_readings(&self, filter: &ReadingFilter) -> StoreResult<Vec<SensorReading>>;

    /// Subscribe to change notifications
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

#[derive(Default)]
struct Tables {
    faults: Vec<FaultRecord>,
    readings: Vec<SensorReading>,
    next_fault_id: i64,
    next_reading_id: i64,
}

/// In-process store
pub struct MemoryStore {
    tables: RwLock<Tables>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_data(Vec::new(), Vec::new())
    }

    /// Create a store holding existing records. Ids are kept; new records
    /// are numbered after the highest existing id.
    pub fn with_data(faults: Vec<FaultRecord>, readings: Vec<SensorReading>) -> Self {
        let (events, _) = broadcast::channel(256);
        let next_fault_id = faults.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        let next_reading_id = readings.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        if !faults.is_empty() || !readings.is_empty() {
            info!(
                faults = faults.len(),
                readings = readings.len(),
                "Loaded existing records"
            );
        }

        Self {
            tables: RwLock::new(Tables {
                faults,
                readings,
                next_fault_id,
                next_reading_id,
            }),
            events,
        }
    }

    fn publish(&self, event: ChangeEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl FaultStore for MemoryStore {
    async fn list_faults(&self, filter: &FaultFilter) -> StoreResult<Vec<FaultRecord>> {
        let tables = self.tables.read();
        let mut faults: Vec<FaultRecord> = tables
            .faults
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect();
        drop(tables);

        faults.sort_by(|a, b| b.time.cmp(&a.time).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            faults.truncate(limit);
        }
        Ok(faults)
    }

    async fn get_fault(&self, id: i64) -> StoreResult<FaultRecord> {
        self.tables
            .read()
            .faults
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(StoreError::FaultNotFound(id))
    }

    async fn insert_fault(&self, fault: NewFault) -> StoreResult<FaultRecord> {
        if !(1..=3).contains(&fault.severity) {
            return Err(StoreError::InvalidRequest(format!(
                "Severity must be between 1 and 3, got {}",
                fault.severity
            )));
        }

        let record = {
            let mut tables = self.tables.write();
            let record = FaultRecord {
                id: tables.next_fault_id,
                device_type: fault.device_type,
                fault_flags: i64::from(fault.fault_flags.bits()),
                floor: Some(fault.floor),
                room: Some(fault.room),
                severity: fault.severity,
                time: fault.time,
                resolved: Some(false),
                resolved_at: None,
            };
            tables.next_fault_id += 1;
            tables.faults.push(record.clone());
            record
        };

        info!(
            fault_id = record.id,
            device_type = %record.device_type,
            floor = fault.floor,
            room = fault.room,
            flags = record.fault_flags,
            "Fault recorded"
        );
        self.publish(ChangeEvent::FaultInserted(record.clone()));
        Ok(record)
    }

    async fn resolve_fault(&self, id: i64, at: DateTime<Utc>) -> StoreResult<FaultRecord> {
        let (record, changed) = {
            let mut tables = self.tables.write();
            let fault = tables
                .faults
                .iter_mut()
                .find(|f| f.id == id)
                .ok_or(StoreError::FaultNotFound(id))?;

            if fault.is_resolved() {
                (fault.clone(), false)
            } else {
                fault.resolved = Some(true);
                fault.resolved_at = Some(at);
                (fault.clone(), true)
            }
        };

        if changed {
            info!(fault_id = id, "Fault resolved");
            self.publish(ChangeEvent::FaultResolved(record.clone()));
        } else {
            debug!(fault_id = id, "Fault already resolved");
        }
        Ok(record)
    }

    async fn rooms_on_floor(&self, floor: i32) -> StoreResult<Vec<i32>> {
        let mut rooms: Vec<i32> = self
            .tables
            .read()
            .faults
            .iter()
            .filter(|f| f.floor == Some(floor))
            .filter_map(|f| f.room)
            .collect();
        rooms.sort_unstable();
        rooms.dedup();

        if rooms.is_empty() {
            return Ok(DEFAULT_ROOMS.to_vec());
        }
        Ok(rooms)
    }

    async fn latest_active_fault(&self, floor: i32, room: i32) -> StoreResult<Option<FaultRecord>> {
        let filter = FaultFilter {
            floor: Some(floor),
            room: Some(room),
            resolved: Some(false),
            limit: Some(1),
            ..Default::default()
        };
        Ok(self.list_faults(&filter).await?.into_iter().next())
    }

    async fn insert_reading(&self, reading: NewReading, now: DateTime<Utc>) -> StoreResult<SensorReading> {
        let stored = {
            let mut tables = self.tables.write();
            let stored = reading.into_reading(tables.next_reading_id, now);
            tables.next_reading_id += 1;
            tables.readings.push(stored.clone());
            stored
        };

        debug!(
            reading_id = stored.id,
            sensor_id = stored.sensor_id,
            sensor_type = %stored.sensor_type,
            "Reading stored"
        );
        self.publish(ChangeEvent::ReadingInserted(stored.clone()));
        Ok(stored)
    }

    async fn list_readings(&self, filter: &ReadingFilter) -> StoreResult<Vec<SensorReading>> {
        let tables = self.tables.read();
        let mut readings: Vec<SensorReading> = tables
            .readings
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        drop(tables);

        readings.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        if let Some(limit) = filter.limit {
            let skip = readings.len().saturating_sub(limit);
            readings.drain(..skip);
        }
        Ok(readings)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
