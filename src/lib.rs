mod client;
mod device;
mod diff;
mod error;
mod logger;
mod notifier;
mod protocol;
mod reconciler;
mod scheduler;
mod settings;
mod types;

pub use client::{IncomfortClient, IncomfortClientBuilder, Transport};
pub use device::*;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use notifier::{CapabilityPublisher, CapabilityValue, Notifier, TracingNotifier};
pub use protocol::{decode_pair, decode_status, parse_heater_list, setpoint_tenths};
pub use reconciler::{validate_override, OverridePhase, OverrideState, Reconciliation};
pub use scheduler::{clamp_interval, spawn_poll_loop, PollHandle};
pub use settings::DeviceSettings;
pub use types::*;
