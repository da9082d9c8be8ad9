//! Fault flag handling for equipment fault records
//!
//! Every fault record carries an integer bitmask in which each bit is
//! permanently assigned to one condition. Bits are independent: a single
//! record may report several conditions at once, and a value of 0 means
//! "no fault".

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Fault bit definitions
pub mod fault_bit {
    /// Bit 0: Sensor not working (IAQ reports all zeros)
    pub const SENSOR_NOT_WORKING: u32 = 0x001;
    /// Bit 1: Calibration error (IAQ reports partial zeros)
    pub const CALIBRATION_ERROR: u32 = 0x002;
    /// Bit 2: Temperature above limit
    pub const TEMP_HIGH: u32 = 0x004;
    /// Bit 3: Humidity above limit
    pub const HUM_HIGH: u32 = 0x008;
    /// Bit 4: CO2 below limit
    pub const CO2_LOW: u32 = 0x010;
    /// Bit 5: CO2 above limit
    pub const CO2_HIGH: u32 = 0x020;
    /// Bit 6: Power meter reads 0.0 kW
    pub const POWER_NOT_WORKING: u32 = 0x040;
    /// Bit 7: Power above spike limit
    pub const POWER_SPIKE: u32 = 0x080;
    /// Bit 8: Presence sensor reports its error value
    pub const PRESENCE_NOT_READING: u32 = 0x100;

    /// Bits reported by IAQ sensors (bits 0-5)
    pub const IAQ_MASK: u32 = SENSOR_NOT_WORKING
        | CALIBRATION_ERROR
        | TEMP_HIGH
        | HUM_HIGH
        | CO2_LOW
        | CO2_HIGH;
    /// Bits reported by power meters (bits 6-7)
    pub const POWER_MASK: u32 = POWER_NOT_WORKING | POWER_SPIKE;
    /// Bits reported by presence sensors (bit 8)
    pub const PRESENCE_MASK: u32 = PRESENCE_NOT_READING;
    /// Every defined bit
    pub const ALL_MASK: u32 = IAQ_MASK | POWER_MASK | PRESENCE_MASK;
}

/// One entry of the canonical fault bit table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultType {
    /// Symbolic name (e.g. "TEMP_HIGH")
    pub name: &'static str,
    /// Bit position
    pub bit: u8,
    /// Power-of-two value of the bit
    pub value: u32,
    /// Human-readable description shown to operators
    pub description: &'static str,
}

/// Canonical fault bit table, in ascending bit order.
///
/// Bit meanings are never reused or reordered.
pub const FAULT_TYPES: [FaultType; 9] = [
    FaultType {
        name: "SENSOR_NOT_WORKING",
        bit: 0,
        value: fault_bit::SENSOR_NOT_WORKING,
        description: "Sensor not working",
    },
    FaultType {
        name: "CALIBRATION_ERROR",
        bit: 1,
        value: fault_bit::CALIBRATION_ERROR,
        description: "Calibration error",
    },
    FaultType {
        name: "TEMP_HIGH",
        bit: 2,
        value: fault_bit::TEMP_HIGH,
        description: "High temperature",
    },
    FaultType {
        name: "HUM_HIGH",
        bit: 3,
        value: fault_bit::HUM_HIGH,
        description: "High humidity",
    },
    FaultType {
        name: "CO2_LOW",
        bit: 4,
        value: fault_bit::CO2_LOW,
        description: "Low CO2",
    },
    FaultType {
        name: "CO2_HIGH",
        bit: 5,
        value: fault_bit::CO2_HIGH,
        description: "High CO2",
    },
    FaultType {
        name: "POWER_NOT_WORKING",
        bit: 6,
        value: fault_bit::POWER_NOT_WORKING,
        description: "Power not working",
    },
    FaultType {
        name: "POWER_SPIKE",
        bit: 7,
        value: fault_bit::POWER_SPIKE,
        description: "Power spike detected",
    },
    FaultType {
        name: "PRESENCE_NOT_READING",
        bit: 8,
        value: fault_bit::PRESENCE_NOT_READING,
        description: "Presence sensor error",
    },
];

/// Look up the bit value for a symbolic name (e.g. "CO2_HIGH" -> 32)
pub fn fault_value(name: &str) -> Option<u32> {
    FAULT_TYPES
        .iter()
        .find(|t| t.name == name)
        .map(|t| t.value)
}

/// Decode a fault bitmask into its descriptions, in ascending bit order.
///
/// Bits above bit 8 are ignored. Negative values are tested bit by bit in
/// two's complement, so `-1` reports every condition.
pub fn decode(flags: i64) -> Vec<&'static str> {
    FAULT_TYPES
        .iter()
        .filter(|t| flags & i64::from(t.value) != 0)
        .map(|t| t.description)
        .collect()
}

/// A fault bitmask restricted to the defined bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct FaultFlags(u32);

impl FaultFlags {
    /// No fault
    pub const NONE: FaultFlags = FaultFlags(0);

    /// Create from a bit value, dropping undefined bits
    pub const fn new(bits: u32) -> Self {
        Self(bits & fault_bit::ALL_MASK)
    }

    /// Create from a stored integer, dropping undefined bits
    pub fn from_raw(raw: i64) -> Self {
        Self::new((raw & i64::from(fault_bit::ALL_MASK)) as u32)
    }

    /// Raw bit value
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when no defined bit is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `mask` is set
    pub const fn contains(self, mask: u32) -> bool {
        self.0 & mask == mask
    }

    /// True when any bit of `mask` is set
    pub const fn intersects(self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    /// Bits set in either value
    pub const fn union(self, other: FaultFlags) -> Self {
        Self(self.0 | other.0)
    }

    /// Set the bits of `mask`
    pub fn insert(&mut self, mask: u32) {
        self.0 = (self.0 | mask) & fault_bit::ALL_MASK;
    }

    /// Keep only the bits of `mask`
    pub const fn masked(self, mask: u32) -> Self {
        Self(self.0 & mask)
    }

    /// Descriptions for the set bits, in canonical order
    pub fn descriptions(self) -> Vec<&'static str> {
        decode(i64::from(self.0))
    }

    /// Symbolic names for the set bits, in canonical order
    pub fn names(self) -> Vec<&'static str> {
        self.types().map(|t| t.name).collect()
    }

    /// Table entries for the set bits, in canonical order
    pub fn types(self) -> impl Iterator<Item = &'static FaultType> {
        FAULT_TYPES.iter().filter(move |t| self.0 & t.value != 0)
    }
}

impl From<u32> for FaultFlags {
    fn from(bits: u32) -> Self {
        Self::new(bits)
    }
}

impl From<FaultFlags> for u32 {
    fn from(flags: FaultFlags) -> Self {
        flags.0
    }
}

impl BitOr for FaultFlags {
    type Output = FaultFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign<u32> for FaultFlags {
    fn bitor_assign(&mut self, rhs: u32) {
        self.insert(rhs);
    }
}

impl fmt::Display for FaultFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

/// Decoded view of a stored bitmask, for display and API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedFlags {
    /// Value as received
    pub raw: i64,
    /// Defined bits only
    pub flags: FaultFlags,
    /// Symbolic names of the set bits
    pub names: Vec<&'static str>,
    /// Descriptions of the set bits
    pub descriptions: Vec<&'static str>,
}

impl DecodedFlags {
    /// Decode a stored integer
    pub fn from_raw(raw: i64) -> Self {
        let flags = FaultFlags::from_raw(raw);
        Self {
            raw,
            flags,
            names: flags.names(),
            descriptions: decode(raw),
        }
    }
}
