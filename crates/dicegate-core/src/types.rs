// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical message model shared by every platform adapter.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The closed set of chat platforms an endpoint can be bound to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Platform {
    #[strum(serialize = "KOOK")]
    #[serde(rename = "KOOK")]
    Kook,
}

/// Whether a message was exchanged one-to-one or inside a group/channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Private,
    Group,
}

/// Normalized role of a sender inside a group.
///
/// Always derived from the platform's native permission data; never stored
/// as a source of truth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Member,
}

/// The author of a canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Canonical (platform-prefixed) user id.
    pub user_id: String,
    /// Display name as reported by the platform.
    pub nickname: String,
    /// Normalized role; `None` outside group context.
    pub group_role: Option<GroupRole>,
}

/// A platform-independent inbound chat event.
///
/// Created once per accepted native event by the owning adapter and handed
/// to the dispatch pipeline. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    /// Platform timestamp (milliseconds since the Unix epoch for KOOK).
    pub time: i64,
    /// Platform-native message id.
    pub raw_id: String,
    /// Raw message text.
    pub text: String,
    pub platform: Platform,
    pub kind: MessageKind,
    /// Canonical group id; empty for private messages.
    pub group_id: String,
    pub sender: Sender,
}

/// Arena key of an endpoint inside a session roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub u32);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ep-{}", self.0)
    }
}

/// Context handed to outbound operations and "message sent" hooks.
///
/// Identifies which session and endpoint originated the send; carries no
/// back-reference to either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgContext {
    pub session: String,
    pub endpoint: EndpointId,
    pub platform: Platform,
}

impl MsgContext {
    pub fn new(session: impl Into<String>, endpoint: EndpointId, platform: Platform) -> Self {
        Self {
            session: session.into(),
            endpoint,
            platform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn platform_tag_is_uppercase() {
        assert_eq!(Platform::Kook.to_string(), "KOOK");
        assert_eq!(Platform::from_str("KOOK").unwrap(), Platform::Kook);
        assert_eq!(serde_json::to_string(&Platform::Kook).unwrap(), "\"KOOK\"");
    }

    #[test]
    fn message_kind_and_role_are_lowercase() {
        assert_eq!(MessageKind::Private.to_string(), "private");
        assert_eq!(MessageKind::Group.to_string(), "group");
        assert_eq!(GroupRole::Admin.to_string(), "admin");
        assert_eq!(
            serde_json::to_string(&GroupRole::Member).unwrap(),
            "\"member\""
        );
    }

    #[test]
    fn endpoint_id_display() {
        assert_eq!(EndpointId(3).to_string(), "ep-3");
    }
}
