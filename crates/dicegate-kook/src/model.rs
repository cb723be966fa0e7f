// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KOOK REST and gateway payloads.
//!
//! Only the fields the adapter reads are modelled; everything else in the
//! platform's JSON is ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::permission::RolePermission;

/// Plain text message.
pub const MESSAGE_TYPE_TEXT: i32 = 1;
/// KMarkdown message.
pub const MESSAGE_TYPE_KMARKDOWN: i32 = 9;
/// System notification (joins, reactions, ...).
pub const MESSAGE_TYPE_SYSTEM: i32 = 255;

/// `channel_type` of a one-to-one conversation.
pub const CHANNEL_TYPE_PERSON: &str = "PERSON";

/// Standard REST response wrapper.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub bot: bool,
    /// Role ids held in the guild the user was viewed in.
    #[serde(default)]
    pub roles: Vec<u64>,
}

impl User {
    /// Guild nickname when set, account name otherwise.
    pub fn display_name(&self) -> &str {
        if self.nickname.is_empty() {
            &self.username
        } else {
            &self.nickname
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Role {
    pub role_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: RolePermission,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub guild_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Guild {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// User id of the guild owner.
    #[serde(default)]
    pub master_id: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// A private chat session, addressed by its code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserChat {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageReceipt {
    pub msg_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub page_total: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayIndex {
    pub url: String,
}

/// A message event pushed by the gateway (`s = 0` frames).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KookEvent {
    /// `GROUP`, `PERSON` or `BROADCAST`.
    pub channel_type: String,
    #[serde(rename = "type")]
    pub message_type: i32,
    /// Channel id for group messages, the receiving user for private ones.
    pub target_id: String,
    pub author_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub msg_id: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub msg_timestamp: i64,
    #[serde(default)]
    pub extra: EventExtra,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct EventExtra {
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub author: Option<User>,
}

impl KookEvent {
    pub fn is_private(&self) -> bool {
        self.channel_type == CHANNEL_TYPE_PERSON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_group_kmarkdown_event() {
        let raw = serde_json::json!({
            "channel_type": "GROUP",
            "type": 9,
            "target_id": "5530891112345678",
            "author_id": "2418200000",
            "content": ".r 1d100",
            "msg_id": "67637d4c-0b5b-4c55-8e05-2f12e1a5b9b1",
            "msg_timestamp": 1_700_000_000_123_i64,
            "nonce": "",
            "extra": {
                "type": 9,
                "guild_id": "7480000000000000",
                "channel_name": "dice",
                "mention": [],
                "author": {
                    "id": "2418200000",
                    "username": "alice",
                    "identify_num": "1234",
                    "nickname": "Alice",
                    "bot": false,
                    "roles": [111, 222]
                }
            }
        });
        let event: KookEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.message_type, MESSAGE_TYPE_KMARKDOWN);
        assert!(!event.is_private());
        assert_eq!(event.extra.guild_id, "7480000000000000");
        let author = event.extra.author.unwrap();
        assert_eq!(author.display_name(), "Alice");
        assert_eq!(author.roles, vec![111, 222]);
    }

    #[test]
    fn decodes_system_event_with_string_extra_type() {
        let raw = serde_json::json!({
            "channel_type": "GROUP",
            "type": 255,
            "target_id": "7480000000000000",
            "author_id": "1",
            "content": "[system]",
            "msg_id": "x",
            "msg_timestamp": 1,
            "extra": {"type": "joined_guild", "body": {"user_id": "9"}}
        });
        let event: KookEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.message_type, MESSAGE_TYPE_SYSTEM);
        assert!(event.extra.author.is_none());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let user = User {
            id: "1".into(),
            username: "bob".into(),
            ..User::default()
        };
        assert_eq!(user.display_name(), "bob");
    }

    #[test]
    fn decodes_guild_with_roles() {
        let raw = serde_json::json!({
            "id": "g1",
            "name": "Tavern",
            "master_id": "42",
            "roles": [
                {"role_id": 0, "name": "@everyone", "permissions": 4096},
                {"role_id": 7, "name": "GM", "permissions": 1}
            ],
            "channels": [{"id": "c1", "name": "dice", "guild_id": "g1"}]
        });
        let guild: Guild = serde_json::from_value(raw).unwrap();
        assert_eq!(guild.roles.len(), 2);
        assert_eq!(guild.roles[1].permissions, RolePermission::ADMIN);
        assert_eq!(guild.channels[0].guild_id, "g1");
    }
}
