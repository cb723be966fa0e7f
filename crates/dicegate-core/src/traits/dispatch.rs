// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator seams toward the command engine and the extension registry.

use crate::lifecycle::EndpointStatus;
use crate::types::{CanonicalMessage, MessageKind, MsgContext};

/// Receives one canonical message per accepted inbound event.
///
/// Called synchronously from the adapter's event pump. The core does not
/// interpret message content.
pub trait MessageDispatcher: Send + Sync + 'static {
    fn execute(&self, endpoint: &EndpointStatus, message: CanonicalMessage);
}

/// Observer invoked after every successful outbound send.
pub trait MessageSentHook: Send + Sync + 'static {
    /// Name used in logs when the hook misbehaves.
    fn name(&self) -> &str;

    fn on_message_sent(
        &self,
        ctx: &MsgContext,
        kind: MessageKind,
        target_id: &str,
        text: &str,
        flag: &str,
    );
}
