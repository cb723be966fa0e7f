// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Dicegate integration tests.
//!
//! Provides mock collaborators for fast, deterministic tests without a
//! network connection.
//!
//! # Components
//!
//! - [`MockAdapter`] - scriptable [`PlatformAdapter`](dicegate_core::PlatformAdapter)
//! - [`RecordingDispatcher`] - captures every dispatched message
//! - [`RecordingHook`] - captures "message sent" notifications
//! - [`MockStore`] - scriptable [`SessionStore`](dicegate_core::SessionStore)

pub mod mock_adapter;
pub mod mock_store;
pub mod recording;

use std::sync::{Arc, Mutex};

pub use mock_adapter::MockAdapter;
pub use mock_store::MockStore;
pub use recording::{RecordingDispatcher, RecordingHook, SentRecord};

/// Ordered log shared by several mocks, used to assert cross-object call order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of a [`CallLog`].
pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
}

pub(crate) fn push(log: &CallLog, entry: String) {
    log.lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .push(entry);
}
