// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dicegate status` command implementation.
//!
//! Reports the configured endpoints of every session together with the
//! endpoint states recorded in its last snapshot. Works whether or not the
//! daemon is running.

use dicegate_config::DicegateConfig;
use dicegate_core::{DicegateError, EndpointStatus};
use serde::Serialize;

use crate::snapshot::SnapshotStore;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub sessions: Vec<SessionStatus>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub name: String,
    pub configured: Vec<ConfiguredEndpoint>,
    /// Unix time of the last snapshot, if one exists.
    pub saved_at: Option<i64>,
    pub endpoints: Vec<EndpointStatus>,
}

#[derive(Debug, Serialize)]
pub struct ConfiguredEndpoint {
    pub platform: String,
    pub enabled: bool,
}

/// Collects configuration and snapshot data for every session.
pub fn collect_status(config: &DicegateConfig) -> Result<StatusResponse, DicegateError> {
    let mut sessions = Vec::with_capacity(config.sessions.len());
    for session in &config.sessions {
        let snapshot = SnapshotStore::new(&config.daemon.data_dir, &session.name).load()?;
        sessions.push(SessionStatus {
            name: session.name.clone(),
            configured: session
                .endpoints
                .iter()
                .map(|e| ConfiguredEndpoint {
                    platform: e.platform_tag().to_string(),
                    enabled: e.enabled(),
                })
                .collect(),
            saved_at: snapshot.as_ref().map(|s| s.saved_at),
            endpoints: snapshot.map(|s| s.endpoints).unwrap_or_default(),
        });
    }
    Ok(StatusResponse { sessions })
}

/// Run the `dicegate status` command.
pub fn run_status(config: &DicegateConfig, json: bool) -> Result<(), DicegateError> {
    let status = collect_status(config)?;
    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| DicegateError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        print!("{}", render_text(&status));
    }
    Ok(())
}

fn render_text(status: &StatusResponse) -> String {
    let mut out = String::new();
    for session in &status.sessions {
        out.push_str(&format!("\n  session {}\n", session.name));
        out.push_str(&format!("  {}\n", "-".repeat(35)));
        for (i, endpoint) in session.configured.iter().enumerate() {
            let enabled = if endpoint.enabled { "enabled" } else { "disabled" };
            out.push_str(&format!("    ep-{i}  {}  {enabled}\n", endpoint.platform));
        }
        match session.saved_at {
            Some(saved_at) => {
                out.push_str(&format!("    last snapshot at {saved_at}\n"));
                for ep in &session.endpoints {
                    let nickname = if ep.nickname.is_empty() { "-" } else { ep.nickname.as_str() };
                    out.push_str(&format!(
                        "    {}  {}  {nickname}  groups={}  {}\n",
                        ep.id, ep.platform, ep.group_num, ep.state
                    ));
                }
            }
            None => out.push_str("    no snapshot saved yet\n"),
        }
    }
    out
}
