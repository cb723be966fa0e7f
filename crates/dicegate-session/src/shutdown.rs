// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling and bounded-time shutdown.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the orchestrator monitors. Cleanup then runs
//! under a watchdog: if it has not finished when the grace period ends, it is
//! run exactly once more and the process is told to exit after a fixed delay.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
/// The signal handler task runs in the background until the token is cancelled.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                        _ = token_clone.cancelled() => return,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = token_clone.cancelled() => return,
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => {
                    info!("received Ctrl+C, initiating shutdown");
                }
                _ = token_clone.cancelled() => return,
            }
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Watchdog timings for [`supervise_cleanup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownTimings {
    /// How long the first cleanup may run before the fallback starts.
    pub grace: Duration,
    /// Pause between the second cleanup and the forced exit.
    pub force_delay: Duration,
}

impl Default for ShutdownTimings {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(7),
            force_delay: Duration::from_secs(3),
        }
    }
}

/// How cleanup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The first cleanup finished inside the grace period.
    Graceful,
    /// The fallback ran; the caller must exit the process now.
    Forced,
}

/// Runs `cleanup` under the shutdown watchdog.
///
/// Each run is spawned on its own task so a panic is caught and logged
/// instead of unwinding through the caller. If the first run does not
/// complete successfully within `timings.grace` (measured from the call),
/// it is aborted and `cleanup` runs once more, bounded by another grace
/// period, followed by a sleep of `timings.force_delay`.
pub async fn supervise_cleanup<F, Fut>(timings: ShutdownTimings, cleanup: F) -> ShutdownOutcome
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let deadline = Instant::now() + timings.grace;

    let mut first = tokio::spawn(cleanup());
    match tokio::time::timeout_at(deadline, &mut first).await {
        Ok(Ok(())) => {
            info!("cleanup completed");
            return ShutdownOutcome::Graceful;
        }
        Ok(Err(e)) => {
            error!(error = %e, "cleanup panicked");
            tokio::time::sleep_until(deadline).await;
        }
        Err(_) => {
            warn!(
                grace_secs = timings.grace.as_secs(),
                "cleanup did not finish in time"
            );
            first.abort();
        }
    }

    warn!("process still alive after grace period, running cleanup again");
    let mut second = tokio::spawn(cleanup());
    match tokio::time::timeout(timings.grace, &mut second).await {
        Ok(Ok(())) => debug!("second cleanup completed"),
        Ok(Err(e)) => error!(error = %e, "second cleanup panicked"),
        Err(_) => {
            warn!("second cleanup did not finish in time");
            second.abort();
        }
    }

    tokio::time::sleep(timings.force_delay).await;
    warn!(
        delay_secs = timings.force_delay.as_secs(),
        "forcing exit"
    );
    ShutdownOutcome::Forced
}
