//! Bounded wait on a page condition.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, trace};

use crate::driver::DriverError;
use crate::error::AutomationError;

/// Limits of a single wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Hard deadline, measured from the start of the wait.
    pub timeout: Duration,
    /// Re-probe interval when no change notification arrives.
    pub poll_interval: Duration,
}

impl WaitOptions {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

/// Wait until `probe` yields a value.
///
/// The probe runs immediately, then again after every change notification
/// and on every poll tick. Once `options.timeout` elapses the wait fails with
/// [`AutomationError::WaitTimeout`] naming `condition`. Driver errors abort
/// the wait.
pub async fn wait_until<T, F, Fut>(
    condition: &str,
    options: WaitOptions,
    mut changes: watch::Receiver<u64>,
    mut probe: F,
) -> Result<T, AutomationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DriverError>>,
{
    let started = Instant::now();
    let deadline = sleep_until(started + options.timeout);
    tokio::pin!(deadline);

    let mut poll = interval_at(started + options.poll_interval, options.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // A dropped change source leaves the poll tick as the only trigger.
    let mut watching = true;
    changes.borrow_and_update();

    loop {
        if let Some(value) = probe().await? {
            debug!("'{}' satisfied after {:?}", condition, started.elapsed());
            return Ok(value);
        }

        tokio::select! {
            _ = &mut deadline => {
                debug!("'{}' timed out after {:?}", condition, options.timeout);
                return Err(AutomationError::WaitTimeout {
                    condition: condition.to_string(),
                    timeout: options.timeout,
                });
            }
            changed = changes.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                } else {
                    trace!("DOM changed, re-checking '{}'", condition);
                }
            }
            _ = poll.tick() => {}
        }
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
