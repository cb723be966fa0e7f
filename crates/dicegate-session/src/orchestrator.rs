// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-level supervision of every session's endpoints.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

use crate::session::Session;
use crate::shutdown::{ShutdownOutcome, ShutdownTimings, supervise_cleanup};

/// Starts endpoints and coordinates their cleanup on shutdown.
pub struct Orchestrator {
    sessions: Vec<Arc<Session>>,
    timings: ShutdownTimings,
}

impl Orchestrator {
    pub fn new(sessions: Vec<Arc<Session>>) -> Self {
        Self {
            sessions,
            timings: ShutdownTimings::default(),
        }
    }

    pub fn with_timings(mut self, timings: ShutdownTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn sessions(&self) -> &[Arc<Session>] {
        &self.sessions
    }

    /// Spawns one `serve()` task per enabled endpoint.
    ///
    /// Failures are logged inside the task; the endpoint is left disabled by
    /// its adapter and nothing is retried.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for session in &self.sessions {
            for adapter in session.adapters() {
                let status = adapter.endpoint().status();
                if !status.enable {
                    info!(
                        session = session.name(),
                        endpoint = %status.id,
                        "endpoint disabled in configuration, not starting"
                    );
                    continue;
                }
                let span = info_span!(
                    "endpoint",
                    session = session.name(),
                    endpoint = %status.id,
                    platform = %status.platform
                );
                handles.push(tokio::spawn(
                    async move {
                        if let Err(e) = adapter.serve().await {
                            error!(status = e.status_code(), error = %e, "endpoint failed to start");
                        }
                    }
                    .instrument(span),
                ));
            }
        }
        if handles.is_empty() {
            warn!("no enabled endpoints configured");
        } else {
            info!(count = handles.len(), "endpoints starting");
        }
        handles
    }

    /// Saves every session, then closes every store, then closes every adapter.
    ///
    /// Individual failures are logged and do not stop the remaining steps.
    pub async fn cleanup(&self) {
        for session in &self.sessions {
            if let Err(e) = session.save().await {
                error!(session = session.name(), error = %e, "failed to save session");
            }
        }
        for session in &self.sessions {
            if let Err(e) = session.close_store().await {
                error!(session = session.name(), error = %e, "failed to close session store");
            }
        }
        for session in &self.sessions {
            session.shutdown_endpoints().await;
        }
    }

    /// Starts all endpoints, waits for `cancel`, then runs supervised cleanup.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> ShutdownOutcome {
        self.start();
        cancel.cancelled().await;
        info!("shutdown requested, cleaning up");

        let timings = self.timings;
        let orchestrator = self;
        supervise_cleanup(timings, move || {
            let orchestrator = orchestrator.clone();
            async move { orchestrator.cleanup().await }
        })
        .await
    }
}
