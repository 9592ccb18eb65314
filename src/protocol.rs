use serde_json::{Map, Value};

use crate::types::*;
use crate::{Error, Result};

pub const HEATER_LIST_PATH: &str = "heaterlist.json";

const DISPLAY_CODE_FIELD: &str = "displ_code";
const IO_FIELD: &str = "IO";

const REQUIRED_PAIRS: &[&str] = &[
    "tap_temp",
    "ch_temp",
    "ch_pressure",
    "room_set_ovr_1",
    "room_temp_set_1",
    "room_temp_1",
];

pub fn status_path(heater: u8) -> String {
    format!("data.json?heater={heater}")
}

pub fn setpoint_path(heater: u8, room: u8, temperature: f64) -> String {
    format!(
        "data.json?heater={heater}&thermostat={room}&setpoint={}",
        setpoint_tenths(temperature)
    )
}

/// Setpoints travel as tenths of a degree above the minimum override.
pub fn setpoint_tenths(temperature: f64) -> i64 {
    ((temperature - MIN_OVERRIDE_TEMP) * 10.0).round() as i64
}

/// Path prefix for a request; authenticated gateways serve under `/protect/`.
pub fn request_path(path: &str, authenticated: bool) -> String {
    if authenticated {
        format!("/protect/{path}")
    } else {
        format!("/{path}")
    }
}

/// Decode `<prefix>_msb` / `<prefix>_lsb`. `None` when either byte is absent.
pub fn decode_pair(prefix: &str, record: &Map<String, Value>) -> Option<PhysicalValue> {
    let msb = byte(record, &format!("{prefix}_msb"))?;
    let lsb = byte(record, &format!("{prefix}_lsb"))?;
    Some(PhysicalValue::from_bytes(msb, lsb))
}

/// A field that is not an integer in `0..=255` is treated as absent.
fn byte(record: &Map<String, Value>, key: &str) -> Option<u8> {
    u8::try_from(record.get(key)?.as_i64()?).ok()
}

fn has_pair(record: &Map<String, Value>, prefix: &str) -> bool {
    decode_pair(prefix, record).is_some()
}

fn decode_room(record: &Map<String, Value>, zone: u8) -> Option<Room> {
    Some(Room {
        temperature: decode_pair(&format!("room_temp_{zone}"), record)?,
        target: decode_pair(&format!("room_temp_set_{zone}"), record)?,
        override_temperature: decode_pair(&format!("room_set_ovr_{zone}"), record)?,
    })
}

pub fn io_flag(io: i64, mask: i64) -> bool {
    io & mask != 0
}

/// Decode a raw `data.json` record. Missing required fields yield
/// `Error::InvalidStatus` carrying the payload.
pub fn decode_status(record: &Value) -> Result<BoilerStatus> {
    let invalid = || Error::InvalidStatus(record.to_string());

    let map = record.as_object().ok_or_else(invalid)?;
    let display_code = map
        .get(DISPLAY_CODE_FIELD)
        .and_then(Value::as_i64)
        .ok_or_else(invalid)?;
    let io = map.get(IO_FIELD).and_then(Value::as_i64).ok_or_else(invalid)?;

    if !REQUIRED_PAIRS.iter().all(|p| has_pair(map, p)) {
        return Err(invalid());
    }

    // Presence checked above.
    let pair = |prefix: &str| decode_pair(prefix, map).unwrap_or(PhysicalValue::Unknown);

    Ok(BoilerStatus {
        display_code,
        display_text: display_code_text(display_code),
        heating: Heating {
            temperature: pair("ch_temp"),
            pressure: pair("ch_pressure"),
        },
        tap: Tap {
            temperature: pair("tap_temp"),
        },
        room1: decode_room(map, 1).ok_or_else(invalid)?,
        room2: decode_room(map, 2),
        is_burning: io_flag(io, BITMASK_BURNER),
        is_failing: io_flag(io, BITMASK_FAIL),
        is_tapping: io_flag(io, BITMASK_TAP),
        is_pumping: io_flag(io, BITMASK_PUMP),
    })
}

/// Parse `heaterlist.json`. Empty slots are `null` and dropped; the rest keep
/// their slot index, which is the `heater` query parameter.
pub fn parse_heater_list(body: &Value) -> Result<Vec<Heater>> {
    let slots = match body.get("heaterlist") {
        Some(Value::Array(slots)) => slots,
        _ => return Err(Error::Protocol(format!("missing heaterlist in {body}"))),
    };
    Ok(slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| {
            let id = slot.as_str()?;
            Some(Heater {
                id: id.to_string(),
                index: u8::try_from(index).ok()?,
            })
        })
        .collect())
}
