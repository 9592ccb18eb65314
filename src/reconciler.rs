//! Override reconciliation.
//!
//! The gateway accepts a setpoint write immediately but only reflects it in
//! the zone's reported `target` some polls later. Until then the value the
//! user asked for is surfaced instead of the lagging device target.

use tracing::{debug, info};

use crate::types::{to_hundredths, Room, MAX_OVERRIDE_TEMP, MIN_OVERRIDE_TEMP};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverridePhase {
    /// Target follows the device.
    Idle,
    /// An override was written; the device target has not caught up yet.
    Pending,
    /// A setpoint write is on the wire.
    InFlight,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Surface this target temperature.
    Publish(f64),
    /// Write outstanding; leave the surfaced target alone.
    Deferred,
    /// Nothing usable this cycle (device reports no reading).
    Stale,
}

/// Override bookkeeping for the managed zone of one device.
#[derive(Debug, Clone, Default)]
pub struct OverrideState {
    requested: Option<f64>,
    in_flight: bool,
    room: u8,
    // Bumped by every accepted request.
    generation: u64,
}

pub fn validate_override(temperature: f64) -> Result<()> {
    if (MIN_OVERRIDE_TEMP..=MAX_OVERRIDE_TEMP).contains(&temperature) {
        Ok(())
    } else {
        Err(Error::OverrideOutOfRange(temperature))
    }
}

impl OverrideState {
    pub fn new(room: u8) -> Self {
        Self {
            room,
            ..Default::default()
        }
    }

    pub fn room(&self) -> u8 {
        self.room
    }

    pub fn requested(&self) -> Option<f64> {
        self.requested
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Tag to take before fetching a status that will later be reconciled.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> OverridePhase {
        if self.in_flight {
            OverridePhase::InFlight
        } else if self.requested.is_some() {
            OverridePhase::Pending
        } else {
            OverridePhase::Idle
        }
    }

    /// Validate and record a user override, entering `InFlight`.
    ///
    /// Returns the value to surface optimistically. On error nothing changes.
    pub fn begin_request(&mut self, temperature: f64) -> Result<f64> {
        validate_override(temperature)?;
        self.requested = Some(temperature);
        self.in_flight = true;
        self.generation += 1;
        Ok(temperature)
    }

    /// The setpoint write returned, successfully or not. The requested value
    /// is kept either way so the next polls keep surfacing it.
    pub fn finish_request(&mut self) {
        self.in_flight = false;
    }

    /// Reconcile against the managed zone of a freshly decoded status.
    ///
    /// `fetched_at` is the [`generation`](Self::generation) taken before the
    /// status was requested. A status fetched before the latest request
    /// predates it and is not used for the target.
    pub fn reconcile(&mut self, room: &Room, fetched_at: u64) -> Reconciliation {
        if self.in_flight {
            debug!(room = self.room, "setpoint write in flight, deferring target");
            return Reconciliation::Deferred;
        }
        if fetched_at != self.generation {
            debug!(room = self.room, "status predates latest override request, deferring target");
            return Reconciliation::Deferred;
        }

        let Some(requested) = self.requested else {
            return match room.target.value() {
                Some(target) => Reconciliation::Publish(target),
                None => Reconciliation::Stale,
            };
        };

        let mut requested = requested;
        if let Some(device_override) = room.override_temperature.value()
            && to_hundredths(device_override) != to_hundredths(requested)
        {
            info!(
                room = self.room,
                previous = requested,
                current = device_override,
                "override temperature changed by another controller"
            );
            requested = device_override;
            self.requested = Some(device_override);
        }

        match room.target.hundredths() {
            Some(target) if target == to_hundredths(requested) => {
                self.requested = None;
                let target = room.target.value().unwrap_or(requested);
                debug!(room = self.room, target, "target temperature caught up");
                Reconciliation::Publish(target)
            }
            _ => {
                debug!(room = self.room, requested, target = %room.target, "target lagging, using override");
                Reconciliation::Publish(requested)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PhysicalValue;

    fn room(target: f64, override_temperature: f64) -> Room {
        Room {
            temperature: PhysicalValue::Value(19.5),
            target: PhysicalValue::Value(target),
            override_temperature: PhysicalValue::Value(override_temperature),
        }
    }

    #[test]
    fn idle_tracks_device_target() {
        let mut state = OverrideState::new(0);
        assert_eq!(state.phase(), OverridePhase::Idle);
        assert_eq!(state.reconcile(&room(18.0, 18.0), state.generation()), Reconciliation::Publish(18.0));
        assert_eq!(state.reconcile(&room(18.5, 18.0), state.generation()), Reconciliation::Publish(18.5));
        assert_eq!(state.phase(), OverridePhase::Idle);
    }

    #[test]
    fn idle_with_unknown_target_is_stale() {
        let mut state = OverrideState::new(0);
        let r = Room {
            target: PhysicalValue::Unknown,
            ..room(18.0, 18.0)
        };
        assert_eq!(state.reconcile(&r, state.generation()), Reconciliation::Stale);
    }

    #[test]
    fn pending_holds_requested_until_device_catches_up() {
        let mut state = OverrideState::new(0);
        assert_eq!(state.begin_request(20.0).unwrap(), 20.0);
        assert_eq!(state.phase(), OverridePhase::InFlight);
        state.finish_request();
        assert_eq!(state.phase(), OverridePhase::Pending);

        assert_eq!(state.reconcile(&room(18.0, 20.0), state.generation()), Reconciliation::Publish(20.0));
        assert_eq!(state.reconcile(&room(18.0, 20.0), state.generation()), Reconciliation::Publish(20.0));
        assert_eq!(state.phase(), OverridePhase::Pending);

        assert_eq!(state.reconcile(&room(20.0, 20.0), state.generation()), Reconciliation::Publish(20.0));
        assert_eq!(state.phase(), OverridePhase::Idle);
        assert_eq!(state.requested(), None);

        assert_eq!(state.reconcile(&room(19.0, 20.0), state.generation()), Reconciliation::Publish(19.0));
    }

    #[test]
    fn pending_with_unknown_override_keeps_requested() {
        let mut state = OverrideState::new(0);
        state.begin_request(21.5).unwrap();
        state.finish_request();
        let r = Room {
            override_temperature: PhysicalValue::Unknown,
            ..room(17.0, 17.0)
        };
        assert_eq!(state.reconcile(&r, state.generation()), Reconciliation::Publish(21.5));
        assert_eq!(state.requested(), Some(21.5));
    }

    #[test]
    fn third_party_override_adopted() {
        let mut state = OverrideState::new(0);
        state.begin_request(20.0).unwrap();
        state.finish_request();

        assert_eq!(state.reconcile(&room(18.0, 22.0), state.generation()), Reconciliation::Publish(22.0));
        assert_eq!(state.requested(), Some(22.0));
        assert_eq!(state.phase(), OverridePhase::Pending);

        assert_eq!(state.reconcile(&room(22.0, 22.0), state.generation()), Reconciliation::Publish(22.0));
        assert_eq!(state.phase(), OverridePhase::Idle);
    }

    #[test]
    fn in_flight_defers_target() {
        let mut state = OverrideState::new(0);
        state.begin_request(25.0).unwrap();
        assert!(state.is_in_flight());
        assert_eq!(state.reconcile(&room(25.0, 25.0), state.generation()), Reconciliation::Deferred);
        assert_eq!(state.requested(), Some(25.0));
        state.finish_request();
        assert!(!state.is_in_flight());
    }

    #[test]
    fn status_fetched_before_request_is_ignored() {
        let mut state = OverrideState::new(0);
        let fetched_at = state.generation();
        state.begin_request(20.0).unwrap();
        state.finish_request();

        // Old override still reported; must not be taken as a third-party change.
        assert_eq!(state.reconcile(&room(18.0, 18.0), fetched_at), Reconciliation::Deferred);
        assert_eq!(state.requested(), Some(20.0));
        assert_eq!(state.phase(), OverridePhase::Pending);

        assert_eq!(state.reconcile(&room(18.0, 20.0), state.generation()), Reconciliation::Publish(20.0));
    }

    #[test]
    fn out_of_range_rejected_without_state_change() {
        let mut state = OverrideState::new(0);
        for t in [4.0, 4.99, 30.01, 31.0, f64::NAN] {
            assert!(matches!(state.begin_request(t), Err(Error::OverrideOutOfRange(_))));
            assert_eq!(state.phase(), OverridePhase::Idle);
        }
        assert!(state.begin_request(5.0).is_ok());
        state.finish_request();
        assert!(state.begin_request(30.0).is_ok());
    }

    #[test]
    fn equality_at_two_decimals() {
        let mut state = OverrideState::new(0);
        state.begin_request(20.1).unwrap();
        state.finish_request();
        // 2010 / 100 as decoded by the gateway codec.
        let decoded = PhysicalValue::from_bytes(7, 218);
        let r = Room {
            target: decoded,
            override_temperature: decoded,
            ..room(0.0, 0.0)
        };
        assert_eq!(state.reconcile(&r, state.generation()), Reconciliation::Publish(20.1));
        assert_eq!(state.phase(), OverridePhase::Idle);
    }
}
