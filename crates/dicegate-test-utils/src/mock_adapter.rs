// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock platform adapter for deterministic lifecycle tests.
//!
//! `MockAdapter` drives its [`EndpointCell`] exactly like a real adapter
//! would, without any network. `serve()` can be scripted to fail or to hang.

use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dicegate_core::{
    DicegateError, EndpointCell, LifecycleEvent, MsgContext, Platform, PlatformAdapter,
};

use crate::{CallLog, push};

pub struct MockAdapter {
    endpoint: EndpointCell,
    connected: AtomicBool,
    fail_serve: AtomicBool,
    hang_serve: AtomicBool,
    serves: AtomicUsize,
    shutdowns: AtomicUsize,
    sent: Mutex<Vec<String>>,
    log: Option<CallLog>,
}

impl MockAdapter {
    pub fn new(endpoint: EndpointCell) -> Self {
        Self {
            endpoint,
            connected: AtomicBool::new(false),
            fail_serve: AtomicBool::new(false),
            hang_serve: AtomicBool::new(false),
            serves: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// Records `shutdown <endpoint>` entries into `log`.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn failing(self) -> Self {
        self.fail_serve.store(true, Ordering::SeqCst);
        self
    }

    /// `serve()` never returns.
    pub fn hanging(self) -> Self {
        self.hang_serve.store(true, Ordering::SeqCst);
        self
    }

    /// Number of connection attempts.
    pub fn serves(&self) -> usize {
        self.serves.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Outbound sends, formatted as `user <id> <text>` / `group <id> <text>`.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, entry: String) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> Platform {
        Platform::Kook
    }

    fn endpoint(&self) -> &EndpointCell {
        &self.endpoint
    }

    async fn serve(&self) -> Result<(), DicegateError> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.serves.fetch_add(1, Ordering::SeqCst);
        self.endpoint.apply(LifecycleEvent::ConnectStarted);
        if self.hang_serve.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_serve.load(Ordering::SeqCst) {
            self.endpoint.apply(LifecycleEvent::ConnectFailed);
            return Err(DicegateError::transport("mock connection refused"));
        }
        self.connected.store(true, Ordering::SeqCst);
        let id = self.endpoint.id();
        self.endpoint.apply(LifecycleEvent::ConnectSucceeded {
            nickname: format!("mock-{}", id.0),
            user_id: format!("KOOK:{}", id.0),
        });
        Ok(())
    }

    async fn set_enabled(&self, enable: bool) {
        if enable {
            let _ = self.serve().await;
        } else if self.connected.swap(false, Ordering::SeqCst) {
            self.endpoint.apply(LifecycleEvent::Disabled);
        }
    }

    async fn reconnect(&self) -> bool {
        self.connected.store(false, Ordering::SeqCst);
        self.endpoint.apply(LifecycleEvent::Disabled);
        self.serve().await.is_ok()
    }

    async fn send_to_user(&self, _ctx: &MsgContext, user_id: &str, text: &str, _flag: &str) {
        self.record(format!("user {user_id} {text}"));
    }

    async fn send_to_group(&self, _ctx: &MsgContext, group_id: &str, text: &str, _flag: &str) {
        self.record(format!("group {group_id} {text}"));
    }

    async fn leave_group(&self, _ctx: &MsgContext, group_id: &str) {
        self.record(format!("leave {group_id}"));
    }

    async fn set_member_display_name(&self, group_id: &str, user_id: &str, name: &str) {
        self.record(format!("nickname {group_id} {user_id} {name}"));
    }

    fn fetch_group_info_async(&self, _group_id: &str) {}

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            push(log, format!("shutdown {}", self.endpoint.id()));
        }
        if self.connected.swap(false, Ordering::SeqCst) {
            self.endpoint.apply(LifecycleEvent::TransportLost);
        }
    }
}
