use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityValue::Bool(b) => write!(f, "{b}"),
            CapabilityValue::Integer(i) => write!(f, "{i}"),
            CapabilityValue::Number(n) => write!(f, "{n}"),
            CapabilityValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for CapabilityValue {
    fn from(b: bool) -> Self {
        CapabilityValue::Bool(b)
    }
}

impl From<i64> for CapabilityValue {
    fn from(i: i64) -> Self {
        CapabilityValue::Integer(i)
    }
}

impl From<f64> for CapabilityValue {
    fn from(n: f64) -> Self {
        CapabilityValue::Number(n)
    }
}

impl From<&str> for CapabilityValue {
    fn from(s: &str) -> Self {
        CapabilityValue::Text(s.to_string())
    }
}

/// Host side of capability updates and flow triggers.
///
/// Called only for actual changes; deciding whether something changed is
/// done by [`CapabilityPublisher`].
pub trait Notifier: Send + Sync {
    fn set_value(&self, capability: &str, value: &CapabilityValue);

    fn trigger(&self, event: &str, capability: &str, value: &CapabilityValue);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn set_value(&self, capability: &str, value: &CapabilityValue) {
        (**self).set_value(capability, value);
    }

    fn trigger(&self, event: &str, capability: &str, value: &CapabilityValue) {
        (**self).trigger(event, capability, value);
    }
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn set_value(&self, capability: &str, value: &CapabilityValue) {
        info!(capability, %value, "capability changed");
    }

    fn trigger(&self, event: &str, capability: &str, value: &CapabilityValue) {
        info!(event, capability, %value, "trigger fired");
    }
}

/// Tracks the last value handed to the notifier per capability and forwards
/// only transitions.
pub struct CapabilityPublisher<N> {
    notifier: N,
    last: Mutex<HashMap<String, CapabilityValue>>,
}

impl<N: Notifier> CapabilityPublisher<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            last: Mutex::new(HashMap::new()),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Tell the publisher what the host currently shows, e.g. values restored
    /// after a restart. Nothing is forwarded.
    pub fn remember(&self, capability: &str, value: CapabilityValue) {
        self.last.lock().insert(capability.to_string(), value);
    }

    pub fn last(&self, capability: &str) -> Option<CapabilityValue> {
        self.last.lock().get(capability).cloned()
    }

    /// Returns the previous value when `value` differs from it (`Some(None)`
    /// on first publication), `None` when unchanged.
    fn record(&self, capability: &str, value: &CapabilityValue) -> Option<Option<CapabilityValue>> {
        let mut last = self.last.lock();
        if last.get(capability) == Some(value) {
            return None;
        }
        Some(last.insert(capability.to_string(), value.clone()))
    }

    /// Forward `value` if it changed. Returns whether it did.
    pub fn publish(&self, capability: &str, value: impl Into<CapabilityValue>) -> bool {
        let value = value.into();
        if self.record(capability, &value).is_none() {
            return false;
        }
        self.notifier.set_value(capability, &value);
        true
    }

    /// Forward `value` if it changed and fire `event` on every change after
    /// the first publication.
    pub fn publish_and_trigger(
        &self,
        capability: &str,
        value: impl Into<CapabilityValue>,
        event: &str,
    ) -> bool {
        let value = value.into();
        let Some(previous) = self.record(capability, &value) else {
            return false;
        };
        self.notifier.set_value(capability, &value);
        if previous.is_some() {
            self.notifier.trigger(event, capability, &value);
        }
        true
    }

    /// Boolean capability with separate events for false→true (`rising`) and
    /// true→false (`falling`). The first publication only sets the baseline.
    pub fn publish_with_trigger(
        &self,
        capability: &str,
        value: bool,
        rising: Option<&str>,
        falling: Option<&str>,
    ) -> bool {
        let value = CapabilityValue::Bool(value);
        let Some(previous) = self.record(capability, &value) else {
            return false;
        };
        self.notifier.set_value(capability, &value);

        let event = match (previous, &value) {
            (Some(CapabilityValue::Bool(false)), CapabilityValue::Bool(true)) => rising,
            (Some(CapabilityValue::Bool(true)), CapabilityValue::Bool(false)) => falling,
            _ => None,
        };
        if let Some(event) = event {
            self.notifier.trigger(event, capability, &value);
        }
        true
    }
}
