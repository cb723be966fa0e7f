// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event filtering and conversion into [`CanonicalMessage`].

use dicegate_core::{CanonicalMessage, GroupRole, KOOK_IDS, MessageKind, Platform, Sender};

use crate::model::{KookEvent, MESSAGE_TYPE_KMARKDOWN, MESSAGE_TYPE_TEXT};

/// Only text and KMarkdown messages are forwarded.
pub fn is_supported(event: &KookEvent) -> bool {
    matches!(event.message_type, MESSAGE_TYPE_TEXT | MESSAGE_TYPE_KMARKDOWN)
}

/// Whether the event was written by a bot, including this endpoint's own account.
///
/// `self_id` is the native id of the bot account this endpoint is logged in as.
pub fn is_self_authored(event: &KookEvent, self_id: &str) -> bool {
    let author_is_bot = event.extra.author.as_ref().is_some_and(|a| a.bot);
    author_is_bot || (!self_id.is_empty() && event.author_id == self_id)
}

/// Builds the canonical message for an accepted event.
///
/// `role` is only used for group messages; private messages never carry one.
pub fn to_canonical(event: &KookEvent, role: GroupRole) -> CanonicalMessage {
    let nickname = event
        .extra
        .author
        .as_ref()
        .map(|a| a.display_name().to_string())
        .unwrap_or_default();

    let (kind, group_id, group_role) = if event.is_private() {
        (MessageKind::Private, String::new(), None)
    } else {
        (
            MessageKind::Group,
            KOOK_IDS.group.encode(&event.target_id),
            Some(role),
        )
    };

    CanonicalMessage {
        time: event.msg_timestamp,
        raw_id: event.msg_id.clone(),
        text: event.content.clone(),
        platform: Platform::Kook,
        kind,
        group_id,
        sender: Sender {
            user_id: KOOK_IDS.user.encode(&event.author_id),
            nickname,
            group_role,
        },
    }
}
