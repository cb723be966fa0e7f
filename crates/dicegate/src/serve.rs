// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dicegate serve` command implementation.
//!
//! Builds one session per `[[sessions]]` entry, attaches a KOOK adapter for
//! each configured endpoint, then hands everything to the orchestrator until
//! a shutdown signal arrives.

use std::sync::Arc;

use dicegate_config::{DicegateConfig, EndpointConfig};
use dicegate_core::{
    CanonicalMessage, DicegateError, EndpointStatus, GroupNameCache, MessageDispatcher, Platform,
    PlatformAdapter, SessionContext,
};
use dicegate_kook::KookAdapter;
use dicegate_session::{Orchestrator, Session, ShutdownOutcome, install_signal_handler};
use tracing::{debug, error, info, warn};

use crate::snapshot::SnapshotStore;

/// Dispatcher used until a command engine is attached: logs every message.
struct LogDispatcher;

impl MessageDispatcher for LogDispatcher {
    fn execute(&self, endpoint: &EndpointStatus, message: CanonicalMessage) {
        debug!(
            endpoint = %endpoint.id,
            kind = %message.kind,
            group_id = message.group_id.as_str(),
            sender = message.sender.user_id.as_str(),
            text = message.text.as_str(),
            "inbound message"
        );
    }
}

/// Runs the gateway until SIGINT/SIGTERM.
pub async fn run_serve(config: DicegateConfig) -> Result<ShutdownOutcome, DicegateError> {
    init_tracing(&config.daemon.log_level);

    info!("starting dicegate serve");

    let sessions = build_sessions(&config, Arc::new(LogDispatcher))?;
    let orchestrator = Arc::new(Orchestrator::new(sessions));
    let cancel = install_signal_handler();

    let outcome = orchestrator.run(cancel).await;
    match outcome {
        ShutdownOutcome::Graceful => info!("dicegate serve shutdown complete"),
        ShutdownOutcome::Forced => warn!("dicegate serve forced shutdown"),
    }
    Ok(outcome)
}

/// Builds every configured session with its snapshot store and endpoints.
///
/// All sessions share one group name cache, seeded from their last snapshots.
/// An endpoint whose adapter cannot be built is logged and skipped.
pub fn build_sessions(
    config: &DicegateConfig,
    dispatcher: Arc<dyn MessageDispatcher>,
) -> Result<Vec<Arc<Session>>, DicegateError> {
    let group_names = Arc::new(GroupNameCache::new());
    let mut sessions = Vec::with_capacity(config.sessions.len());

    for session_config in &config.sessions {
        let store = SnapshotStore::new(&config.daemon.data_dir, &session_config.name);
        match store.load() {
            Ok(Some(snapshot)) => {
                debug!(
                    session = session_config.name.as_str(),
                    groups = snapshot.group_names.len(),
                    "restored group names from snapshot"
                );
                group_names.restore(snapshot.group_names);
            }
            Ok(None) => {}
            Err(e) => warn!(
                session = session_config.name.as_str(),
                error = %e,
                "ignoring unreadable snapshot"
            ),
        }

        let ctx = SessionContext::new(session_config.name.clone(), dispatcher.clone())
            .with_group_names(group_names.clone());
        let session = Session::new(ctx, Arc::new(store));

        for endpoint in &session_config.endpoints {
            let added = match endpoint {
                EndpointConfig::Kook(kook) => {
                    session.add_endpoint(Platform::Kook, kook.enabled, |cell, ctx| {
                        let adapter = KookAdapter::from_config(kook, cell, ctx)?;
                        Ok(Arc::new(adapter) as Arc<dyn PlatformAdapter>)
                    })
                }
            };
            if let Err(e) = added {
                error!(
                    session = session_config.name.as_str(),
                    platform = endpoint.platform_tag(),
                    error = %e,
                    "skipping endpoint"
                );
            }
        }

        info!(
            session = session.name(),
            endpoints = session.len(),
            "session ready"
        );
        sessions.push(Arc::new(session));
    }

    Ok(sessions)
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dicegate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
