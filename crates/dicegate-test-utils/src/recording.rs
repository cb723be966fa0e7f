// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording dispatcher and "message sent" hook.

use std::sync::Mutex;
use std::time::Duration;

use dicegate_core::{CanonicalMessage, EndpointStatus, MessageDispatcher, MessageKind, MessageSentHook, MsgContext};
use tokio::sync::watch;

use crate::{CallLog, push};

/// Captures every message handed to [`MessageDispatcher::execute`].
pub struct RecordingDispatcher {
    received: Mutex<Vec<(EndpointStatus, CanonicalMessage)>>,
    count: watch::Sender<usize>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            count: watch::Sender::new(0),
        }
    }

    pub fn messages(&self) -> Vec<CanonicalMessage> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Endpoint status snapshots passed alongside each message.
    pub fn endpoints(&self) -> Vec<EndpointStatus> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        *self.count.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until at least `count` messages arrived. Returns false on timeout.
    pub async fn wait_for(&self, count: usize, limit: Duration) -> bool {
        let mut rx = self.count.subscribe();
        matches!(
            tokio::time::timeout(limit, rx.wait_for(|n| *n >= count)).await,
            Ok(Ok(_))
        )
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDispatcher for RecordingDispatcher {
    fn execute(&self, endpoint: &EndpointStatus, message: CanonicalMessage) {
        self.received
            .lock()
            .unwrap()
            .push((endpoint.clone(), message));
        self.count.send_modify(|n| *n += 1);
    }
}

/// One captured "message sent" notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub ctx: MsgContext,
    pub kind: MessageKind,
    pub target_id: String,
    pub text: String,
    pub flag: String,
}

/// Hook that records its calls, optionally appending its name to a shared log.
pub struct RecordingHook {
    name: String,
    calls: Mutex<Vec<SentRecord>>,
    order: Option<CallLog>,
}

impl RecordingHook {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: Mutex::new(Vec::new()),
            order: None,
        }
    }

    /// Also appends `name` to `order` on every call.
    pub fn with_order_log(name: &str, order: CallLog) -> Self {
        Self {
            order: Some(order),
            ..Self::new(name)
        }
    }

    pub fn calls(&self) -> Vec<SentRecord> {
        self.calls.lock().unwrap().clone()
    }
}

impl MessageSentHook for RecordingHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_message_sent(&self, ctx: &MsgContext, kind: MessageKind, target_id: &str, text: &str, flag: &str) {
        self.calls.lock().unwrap().push(SentRecord {
            ctx: ctx.clone(),
            kind,
            target_id: target_id.to_string(),
            text: text.to_string(),
            flag: flag.to_string(),
        });
        if let Some(order) = &self.order {
            push(order, self.name.clone());
        }
    }
}
