use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::client::{IncomfortClient, Transport};
use crate::notifier::{CapabilityPublisher, Notifier};
use crate::reconciler::{validate_override, OverridePhase, OverrideState, Reconciliation};
use crate::settings::DeviceSettings;
use crate::types::*;
use crate::{Error, Result};

pub const DISPLAY_CODE: &str = "display_code";
pub const DISPLAY_TEXT: &str = "display_text";
pub const IS_PUMPING: &str = "is_pumping";
pub const IS_BURNING: &str = "is_burning";
pub const IS_TAPPING: &str = "is_tapping";
pub const ALARM_GENERIC: &str = "alarm_generic";
pub const MEASURE_TEMPERATURE: &str = "measure_temperature";
pub const MEASURE_PRESSURE: &str = "measure_pressure";
pub const HEATER_WATER_TEMPERATURE: &str = "measure_temperature.heater_water";
pub const TAP_WATER_TEMPERATURE: &str = "measure_temperature.tap_water";
pub const TARGET_TEMPERATURE: &str = "target_temperature";

pub const DISPLAY_CODE_CHANGED: &str = "display_code_changed";
pub const STARTS_PUMPING: &str = "boiler_starts_pumping";
pub const STOPS_PUMPING: &str = "boiler_stops_pumping";
pub const STARTS_BURNING: &str = "boiler_starts_burning";
pub const STOPS_BURNING: &str = "boiler_stops_burning";

/// bar → mbar
const PRESSURE_SCALE: f64 = 1000.0;

/// One boiler behind a gateway: status publication plus override handling
/// for a single thermostat zone.
pub struct BoilerDevice<T, N> {
    transport: T,
    publisher: CapabilityPublisher<N>,
    heater: u8,
    state: Mutex<OverrideState>,
    // Serializes setpoint writes so only one is ever in flight.
    write_lock: tokio::sync::Mutex<()>,
}

impl<N: Notifier> BoilerDevice<IncomfortClient, N> {
    pub fn from_settings(settings: &DeviceSettings, notifier: N) -> Result<Self> {
        let client = IncomfortClient::from_settings(settings)?;
        Ok(Self::new(client, notifier, settings.heater_index, settings.room))
    }
}

impl<T: Transport, N: Notifier> BoilerDevice<T, N> {
    pub fn new(transport: T, notifier: N, heater: u8, room: u8) -> Self {
        info!(heater, room, "boiler device initialized");
        Self {
            transport,
            publisher: CapabilityPublisher::new(notifier),
            heater,
            state: Mutex::new(OverrideState::new(room)),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn heater(&self) -> u8 {
        self.heater
    }

    pub fn room(&self) -> u8 {
        self.state.lock().room()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn publisher(&self) -> &CapabilityPublisher<N> {
        &self.publisher
    }

    pub fn override_phase(&self) -> OverridePhase {
        self.state.lock().phase()
    }

    pub fn requested_override(&self) -> Option<f64> {
        self.state.lock().requested()
    }

    /// One poll cycle: fetch, decode, publish, reconcile the target.
    ///
    /// Failures leave every published value as it was.
    pub async fn poll_once(&self) -> Result<BoilerStatus> {
        let fetched_at = self.state.lock().generation();
        let status = match self.transport.fetch_status(self.heater).await {
            Ok(status) => status,
            Err(e) => {
                match &e {
                    Error::InvalidStatus(raw) => {
                        warn!(heater = self.heater, payload = %raw, "invalid status payload");
                    }
                    _ => warn!(heater = self.heater, error = %e, "failed to update status"),
                }
                return Err(e);
            }
        };

        let room = self.room();
        let managed = status.room(room);
        if managed.is_none() {
            warn!(heater = self.heater, room, "managed room missing from status");
        }

        self.publish_status(&status, managed);

        let outcome = match managed {
            Some(r) => self.state.lock().reconcile(r, fetched_at),
            None => Reconciliation::Stale,
        };
        if let Reconciliation::Publish(target) = outcome {
            self.publisher.publish(TARGET_TEMPERATURE, target);
        }

        Ok(status)
    }

    fn publish_status(&self, status: &BoilerStatus, managed: Option<&Room>) {
        let p = &self.publisher;

        p.publish_and_trigger(DISPLAY_CODE, status.display_code, DISPLAY_CODE_CHANGED);
        p.publish(DISPLAY_TEXT, status.display_text);

        p.publish_with_trigger(
            IS_PUMPING,
            status.is_pumping,
            Some(STARTS_PUMPING),
            Some(STOPS_PUMPING),
        );
        p.publish_with_trigger(
            IS_BURNING,
            status.is_burning,
            Some(STARTS_BURNING),
            Some(STOPS_BURNING),
        );
        p.publish(IS_TAPPING, status.is_tapping);
        p.publish(ALARM_GENERIC, status.is_failing);

        if let Some(room) = managed {
            self.publish_reading(MEASURE_TEMPERATURE, room.temperature, 1.0);
        }
        self.publish_reading(MEASURE_PRESSURE, status.heating.pressure, PRESSURE_SCALE);
        self.publish_reading(HEATER_WATER_TEMPERATURE, status.heating.temperature, 1.0);
        self.publish_reading(TAP_WATER_TEMPERATURE, status.tap.temperature, 1.0);
    }

    fn publish_reading(&self, capability: &str, reading: PhysicalValue, scale: f64) {
        match reading.value() {
            Some(v) => {
                self.publisher.publish(capability, v * scale);
            }
            None => debug!(capability, "no reading, keeping previous value"),
        }
    }

    /// Ask the boiler to hold `temperature` in the managed zone.
    ///
    /// The target is published optimistically before the write goes out.
    /// Out-of-range values are rejected without any request.
    pub async fn request_override(&self, temperature: f64) -> Result<()> {
        let room = self.room();
        info!(heater = self.heater, room, temperature, "setting override temperature");

        if let Err(e) = validate_override(temperature) {
            warn!(heater = self.heater, room, temperature, "rejected override: {e}");
            return Err(e);
        }

        let _write = self.write_lock.lock().await;
        self.state.lock().begin_request(temperature)?;
        self.publisher.publish(TARGET_TEMPERATURE, temperature);

        let result = self
            .transport
            .set_temperature(self.heater, room, temperature)
            .await;
        self.state.lock().finish_request();

        if let Err(ref e) = result {
            error!(
                heater = self.heater,
                room,
                temperature,
                error = %e,
                "override write failed, keeping requested temperature"
            );
        }
        result
    }
}
