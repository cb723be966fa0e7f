// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Endpoint lifecycle state machine.
//!
//! States: `Disconnected` (initial) -> `Connecting` -> `Connected` ->
//! `Disconnected`. There is no automatic retry; recovery is triggered by an
//! operator or the orchestrator calling `reconnect()` / `set_enabled(true)`.
//!
//! The enabled flag and the state are stored behind one lock and updated by a
//! single [`transition`], so status readers never observe a torn pair.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{EndpointId, Platform};

/// Connection state of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
}

impl ConnectionState {
    /// Numeric code exposed on the status surface.
    pub fn code(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::Connecting => 2,
        }
    }
}

impl From<ConnectionState> for u8 {
    fn from(state: ConnectionState) -> u8 {
        state.code()
    }
}

impl TryFrom<u8> for ConnectionState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ConnectionState::Disconnected),
            1 => Ok(ConnectionState::Connected),
            2 => Ok(ConnectionState::Connecting),
            other => Err(format!("unknown connection state code {other}")),
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Connecting => write!(f, "connecting"),
        }
    }
}

/// Inputs that drive the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `serve()` has started the handshake.
    ConnectStarted,
    /// Handshake finished; identity of the bot account is known.
    ConnectSucceeded { nickname: String, user_id: String },
    /// Handshake failed; the endpoint is left disabled.
    ConnectFailed,
    /// Operator disabled the endpoint (or a reconnect tore it down).
    Disabled,
    /// The transport went away without being asked to.
    TransportLost,
}

/// Point-in-time status of one endpoint, as read by the status surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub id: EndpointId,
    pub platform: Platform,
    pub nickname: String,
    pub user_id: String,
    pub group_num: i64,
    pub enable: bool,
    pub state: ConnectionState,
}

impl EndpointStatus {
    pub fn new(id: EndpointId, platform: Platform, enable: bool) -> Self {
        Self {
            id,
            platform,
            nickname: String::new(),
            user_id: String::new(),
            group_num: 0,
            enable,
            state: ConnectionState::Disconnected,
        }
    }
}

/// Applies one lifecycle event to a status record.
pub fn transition(status: &mut EndpointStatus, event: LifecycleEvent) {
    match event {
        LifecycleEvent::ConnectStarted => {
            status.state = ConnectionState::Connecting;
        }
        LifecycleEvent::ConnectSucceeded { nickname, user_id } => {
            status.nickname = nickname;
            status.user_id = user_id;
            status.state = ConnectionState::Connected;
            status.enable = true;
        }
        LifecycleEvent::ConnectFailed | LifecycleEvent::Disabled => {
            status.state = ConnectionState::Disconnected;
            status.enable = false;
        }
        LifecycleEvent::TransportLost => {
            status.state = ConnectionState::Disconnected;
        }
    }
}

/// Shared, lock-protected status of one endpoint.
///
/// Held by the roster and by the endpoint's own adapter; cloning shares the
/// same record.
#[derive(Debug, Clone)]
pub struct EndpointCell {
    inner: Arc<RwLock<EndpointStatus>>,
}

impl EndpointCell {
    pub fn new(id: EndpointId, platform: Platform, enable: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(EndpointStatus::new(id, platform, enable))),
        }
    }

    pub fn id(&self) -> EndpointId {
        self.read(|s| s.id)
    }

    /// Returns a consistent snapshot of the record.
    pub fn status(&self) -> EndpointStatus {
        self.read(|s| s.clone())
    }

    pub fn state(&self) -> ConnectionState {
        self.read(|s| s.state)
    }

    pub fn is_enabled(&self) -> bool {
        self.read(|s| s.enable)
    }

    /// Canonical user id of the bot account, empty before the first connect.
    pub fn user_id(&self) -> String {
        self.read(|s| s.user_id.clone())
    }

    /// Applies `event` and returns the resulting state.
    pub fn apply(&self, event: LifecycleEvent) -> ConnectionState {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let from = guard.state;
        transition(&mut guard, event);
        debug!(
            endpoint = %guard.id,
            from = %from,
            to = %guard.state,
            enable = guard.enable,
            "endpoint transition"
        );
        guard.state
    }

    pub fn set_group_num(&self, group_num: i64) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.group_num = group_num;
    }

    fn read<T>(&self, f: impl FnOnce(&EndpointStatus) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> EndpointCell {
        EndpointCell::new(EndpointId(0), Platform::Kook, true)
    }

    #[test]
    fn starts_disconnected() {
        let cell = cell();
        assert_eq!(cell.state(), ConnectionState::Disconnected);
        assert!(cell.is_enabled());
        assert!(cell.user_id().is_empty());
    }

    #[test]
    fn successful_connect_populates_identity() {
        let cell = cell();
        assert_eq!(cell.apply(LifecycleEvent::ConnectStarted), ConnectionState::Connecting);
        let state = cell.apply(LifecycleEvent::ConnectSucceeded {
            nickname: "dicebot".into(),
            user_id: "KOOK:42".into(),
        });
        assert_eq!(state, ConnectionState::Connected);
        let status = cell.status();
        assert_eq!(status.nickname, "dicebot");
        assert_eq!(status.user_id, "KOOK:42");
        assert!(status.enable);
    }

    #[test]
    fn failed_connect_disables() {
        let cell = cell();
        cell.apply(LifecycleEvent::ConnectStarted);
        cell.apply(LifecycleEvent::ConnectFailed);
        let status = cell.status();
        assert_eq!(status.state, ConnectionState::Disconnected);
        assert!(!status.enable);
    }

    #[test]
    fn transport_loss_keeps_enable_intent() {
        let cell = cell();
        cell.apply(LifecycleEvent::ConnectSucceeded {
            nickname: "n".into(),
            user_id: "KOOK:1".into(),
        });
        cell.apply(LifecycleEvent::TransportLost);
        assert_eq!(cell.state(), ConnectionState::Disconnected);
        assert!(cell.is_enabled());
    }

    #[test]
    fn disable_clears_pair_together() {
        let cell = cell();
        cell.apply(LifecycleEvent::ConnectSucceeded {
            nickname: "n".into(),
            user_id: "KOOK:1".into(),
        });
        cell.apply(LifecycleEvent::Disabled);
        let status = cell.status();
        assert_eq!((status.enable, status.state), (false, ConnectionState::Disconnected));
    }

    #[test]
    fn state_serializes_as_numeric_code() {
        let status = EndpointStatus::new(EndpointId(1), Platform::Kook, true);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], 0);
        assert_eq!(json["platform"], "KOOK");
        let back: EndpointStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn clones_share_the_record() {
        let a = cell();
        let b = a.clone();
        a.set_group_num(7);
        assert_eq!(b.status().group_num, 7);
    }
}
