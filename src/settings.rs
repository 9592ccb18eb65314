use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::{MAX_QUERY_INTERVAL, MIN_QUERY_INTERVAL};
use crate::{Error, Result};

/// Per-device settings as stored by the pairing flow.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSettings {
    pub host: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(
        default = "default_interval",
        alias = "updateInterval",
        deserialize_with = "lenient_interval"
    )]
    pub refresh_interval: u64,
    #[serde(default)]
    pub heater_index: u8,
    #[serde(default)]
    pub room: u8,
}

fn default_interval() -> u64 {
    MIN_QUERY_INTERVAL
}

fn lenient_interval<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u64, D::Error> {
    let raw = Value::deserialize(d)?;
    Ok(clamp_interval_value(&raw))
}

/// Seconds from an arbitrary settings value. Anything that is not a finite
/// number of at least `MIN_QUERY_INTERVAL` becomes `MIN_QUERY_INTERVAL`;
/// larger values are capped at `MAX_QUERY_INTERVAL`.
pub fn clamp_interval_value(raw: &Value) -> u64 {
    let secs = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match secs {
        Some(s) if s.is_finite() && s >= MIN_QUERY_INTERVAL as f64 => {
            s.min(MAX_QUERY_INTERVAL as f64) as u64
        }
        _ => MIN_QUERY_INTERVAL,
    }
}

impl DeviceSettings {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            refresh_interval: MIN_QUERY_INTERVAL,
            heater_index: 0,
            room: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Protocol(format!("settings: {e}")))
    }

    /// Basic-auth pair; `None` when no username is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self.username.as_deref() {
            Some(user) if !user.is_empty() => {
                Some((user, self.password.as_deref().unwrap_or("")))
            }
            _ => None,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        let secs = self.refresh_interval.clamp(MIN_QUERY_INTERVAL, MAX_QUERY_INTERVAL);
        Duration::from_secs(secs)
    }
}
