//! Daemon configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 18090
//!
//! [detection]
//! temp_high = 35.0
//! power_spike_kw = 45.0
//!
//! [sensors]
//! offline_threshold_secs = 300
//!
//! [seed]
//! faults = "data/faults.json"
//! readings = "data/readings.json"
//! ```
//!
//! Every section and field is optional.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use bms_core::{DetectionThresholds, FaultRecord, SensorReading, DEFAULT_OFFLINE_THRESHOLD_SECS};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    pub detection: DetectionThresholds,
    pub sensors: SensorConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 18090,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Seconds without a reading before a sensor is reported offline
    pub offline_threshold_secs: i64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            offline_threshold_secs: DEFAULT_OFFLINE_THRESHOLD_SECS,
        }
    }
}

/// JSON exports loaded into the store at start-up
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub faults: Option<PathBuf>,
    pub readings: Option<PathBuf>,
}

impl DaemonConfig {
    /// Load a TOML config file. Relative seed paths are resolved against the
    /// config file's directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: DaemonConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.seed.faults = config.seed.faults.map(|p| base.join(p));
            config.seed.readings = config.seed.readings.map(|p| base.join(p));
        }

        if config.sensors.offline_threshold_secs <= 0 {
            anyhow::bail!(
                "sensors.offline_threshold_secs must be positive, got {}",
                config.sensors.offline_threshold_secs
            );
        }

        Ok(config)
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .with_context(|| format!("Invalid listen address {}", addr))
    }
}

impl SeedConfig {
    pub fn load_faults(&self) -> anyhow::Result<Vec<FaultRecord>> {
        match &self.faults {
            Some(path) => load_json(path),
            None => Ok(Vec::new()),
        }
    }

    pub fn load_readings(&self) -> anyhow::Result<Vec<SensorReading>> {
        match &self.readings {
            Some(path) => load_json(path),
            None => Ok(Vec::new()),
        }
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid seed file {}", path.display()))
}
