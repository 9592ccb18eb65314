use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::Transport;
use crate::device::BoilerDevice;
use crate::notifier::Notifier;
use crate::types::{MAX_QUERY_INTERVAL, MIN_QUERY_INTERVAL};

pub fn clamp_interval(interval: Duration) -> Duration {
    interval.clamp(
        Duration::from_secs(MIN_QUERY_INTERVAL),
        Duration::from_secs(MAX_QUERY_INTERVAL),
    )
}

/// Extra delay after a failed cycle, uniform in `[0, interval / 4)`.
pub fn failure_jitter(interval: Duration) -> Duration {
    let span = u64::try_from(interval.as_millis() / 4).unwrap_or(u64::MAX);
    if span == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..span))
}

/// Handle to a running poll loop.
///
/// Dropping the handle stops the loop the same way [`PollHandle::stop`] does.
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Prevent further cycles. A cycle already running is allowed to finish.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop and wait for the current cycle to finish.
    pub async fn join(self) {
        self.stop();
        if let Err(e) = self.task.await {
            warn!(error = %e, "poll loop task failed");
        }
    }
}

/// Start polling `device` every `interval` (at least `MIN_QUERY_INTERVAL`).
/// The first cycle runs immediately.
pub fn spawn_poll_loop<T, N>(device: Arc<BoilerDevice<T, N>>, interval: Duration) -> PollHandle
where
    T: Transport + 'static,
    N: Notifier + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run_poll_loop(device, clamp_interval(interval), stop_rx));
    PollHandle { stop_tx, task }
}

async fn run_poll_loop<T, N>(
    device: Arc<BoilerDevice<T, N>>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) where
    T: Transport,
    N: Notifier,
{
    let heater = device.heater();
    info!(heater, interval_secs = interval.as_secs(), "poll loop started");

    loop {
        let ok = device.poll_once().await.is_ok();

        if *stop_rx.borrow() {
            break;
        }

        let delay = if ok {
            interval
        } else {
            interval.saturating_add(failure_jitter(interval))
        };
        debug!(heater, delay_ms = delay.as_millis() as u64, "next poll scheduled");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if *stop_rx.borrow() {
            break;
        }
    }

    info!(heater, "poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_clamped() {
        assert_eq!(clamp_interval(Duration::from_secs(1)), Duration::from_secs(10));
        assert_eq!(clamp_interval(Duration::ZERO), Duration::from_secs(10));
        assert_eq!(clamp_interval(Duration::from_secs(60)), Duration::from_secs(60));
        assert_eq!(clamp_interval(Duration::MAX), Duration::from_secs(86_400));
    }

    #[test]
    fn jitter_within_quarter_interval() {
        let interval = Duration::from_secs(10);
        for _ in 0..200 {
            assert!(failure_jitter(interval) < Duration::from_millis(2500));
        }
        assert_eq!(failure_jitter(Duration::from_millis(3)), Duration::ZERO);
    }

    #[test]
    fn jitter_on_huge_interval_does_not_overflow() {
        let jitter = failure_jitter(Duration::MAX);
        assert_eq!(Duration::MAX.saturating_add(jitter), Duration::MAX);

        let day = clamp_interval(Duration::MAX);
        assert!(failure_jitter(day) < Duration::from_secs(86_400 / 4));
    }
}
