use std::fmt;

use serde::Serialize;

pub const MIN_OVERRIDE_TEMP: f64 = 5.0;
pub const MAX_OVERRIDE_TEMP: f64 = 30.0;

/// Raw combined byte value the gateway reports for a sensor without a reading.
pub const INVALID_RAW: u32 = (1 << 15) - 1;

/// Seconds.
pub const MIN_QUERY_INTERVAL: u64 = 10;
/// Seconds. One day.
pub const MAX_QUERY_INTERVAL: u64 = 86_400;

pub const BITMASK_FAIL: i64 = 0x01;
pub const BITMASK_PUMP: i64 = 0x02;
pub const BITMASK_TAP: i64 = 0x04;
pub const BITMASK_BURNER: i64 = 0x08;

/// A decoded two-byte quantity in hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PhysicalValue {
    Value(f64),
    Unknown,
}

impl PhysicalValue {
    pub fn from_bytes(msb: u8, lsb: u8) -> Self {
        let raw = (u32::from(msb) << 8) | u32::from(lsb);
        if raw == INVALID_RAW {
            PhysicalValue::Unknown
        } else {
            PhysicalValue::Value(raw as f64 / 100.0)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            PhysicalValue::Value(v) => Some(*v),
            PhysicalValue::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PhysicalValue::Unknown)
    }

    /// Value at the decoder's two-decimal resolution.
    pub fn hundredths(&self) -> Option<i64> {
        self.value().map(to_hundredths)
    }
}

pub(crate) fn to_hundredths(v: f64) -> i64 {
    (v * 100.0).round() as i64
}

impl fmt::Display for PhysicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalValue::Value(v) => write!(f, "{v:.2}"),
            PhysicalValue::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Heating {
    pub temperature: PhysicalValue,
    pub pressure: PhysicalValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tap {
    pub temperature: PhysicalValue,
}

/// One thermostat zone as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Room {
    pub temperature: PhysicalValue,
    /// Setpoint the boiler is currently working towards.
    pub target: PhysicalValue,
    /// The gateway's echo of the last override written for this zone.
    #[serde(rename = "override")]
    pub override_temperature: PhysicalValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoilerStatus {
    pub display_code: i64,
    pub display_text: &'static str,
    pub heating: Heating,
    pub tap: Tap,
    pub room1: Room,
    pub room2: Option<Room>,
    pub is_burning: bool,
    pub is_failing: bool,
    pub is_tapping: bool,
    pub is_pumping: bool,
}

impl BoilerStatus {
    /// Zone by the index used for setpoint writes (0 = room1).
    pub fn room(&self, index: u8) -> Option<&Room> {
        match index {
            0 => Some(&self.room1),
            1 => self.room2.as_ref(),
            _ => None,
        }
    }
}

const DISPLAY_CODES: &[(i64, &str)] = &[
    (0, "opentherm"),
    (15, "boiler ext."),
    (24, "frost"),
    (37, "central heating rf"),
    (51, "tapwater int."),
    (85, "sensortest"),
    (102, "central heating"),
    (126, "standby"),
    (153, "postrun boiler"),
    (170, "service"),
    (204, "tapwater"),
    (231, "postrun ch"),
    (240, "boiler int."),
    (255, "buffer"),
];

pub fn display_code_text(code: i64) -> &'static str {
    DISPLAY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, text)| *text)
        .unwrap_or("Unknown")
}

/// A boiler attached to the gateway, as listed by `heaterlist.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heater {
    pub id: String,
    pub index: u8,
}

impl Heater {
    pub fn display_name(&self) -> String {
        format!("Intergas Incomfort ({})", self.id)
    }
}
