// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator used by the orchestrator during cleanup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DicegateError;
use crate::group::GroupNameEntry;
use crate::lifecycle::EndpointStatus;

/// Everything a session hands to its store on save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub name: String,
    /// Unix time (seconds) the snapshot was taken.
    pub saved_at: i64,
    pub endpoints: Vec<EndpointStatus>,
    pub group_names: Vec<(String, GroupNameEntry)>,
}

/// Storage handle owned by one session.
///
/// During cleanup the orchestrator calls `save` on every session first and
/// only then `close` on every store. Both may be called again if cleanup is
/// retried, so implementations must tolerate repeated calls.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), DicegateError>;

    async fn close(&self) -> Result<(), DicegateError>;
}
