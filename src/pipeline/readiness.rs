//! Readiness wait
//!
//! Polls the app runner until the desired number of instances report running
//! or the deadline passes. Time comes from tokio's clock so tests can run
//! with a paused clock.

use crate::runner::{AppRunner, AppStatus};
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessTimeout {
    pub timeout: Duration,
    pub desired: u32,
    /// Running instances seen on the last successful poll
    pub running: usize,
}

/// Waits until `desired` instances of `app_name` are running
///
/// Status lookup failures are logged and polling continues. The wait is
/// bounded by `timeout` plus one `interval`: a status call still pending at
/// that point is abandoned. `on_poll` sees every status.
pub async fn wait_for_ready<F>(
    runner: &dyn AppRunner,
    app_name: &str,
    desired: u32,
    timeout: Duration,
    interval: Duration,
    mut on_poll: F,
) -> Result<AppStatus, ReadinessTimeout>
where
    F: FnMut(&AppStatus),
{
    let deadline = Instant::now() + timeout;
    let cutoff = deadline + interval;
    let mut running = 0;

    loop {
        match timeout_at(cutoff, runner.app_status(app_name)).await {
            Ok(Ok(status)) => {
                running = status.running_instances();
                debug!(app = %app_name, running, desired, "Polled app status");
                on_poll(&status);
                if running >= desired as usize {
                    return Ok(status);
                }
            }
            Ok(Err(e)) => {
                warn!(app = %app_name, error = %e, "Failed to poll app status");
            }
            Err(_) => {
                warn!(app = %app_name, "App status poll did not finish before the readiness deadline");
                return Err(ReadinessTimeout {
                    timeout,
                    desired,
                    running,
                });
            }
        }

        if Instant::now() >= deadline {
            return Err(ReadinessTimeout {
                timeout,
                desired,
                running,
            });
        }

        sleep(interval).await;
    }
}
