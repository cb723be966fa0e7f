// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Guild permission resolution and the normalized sender role.
//!
//! Only guild roles are evaluated. Per-channel permission overwrites are not,
//! since the result is used solely to tell administrators apart from members.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use dicegate_core::GroupRole;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Guild;
use crate::transport::KookTransport;

/// Role id every guild member holds implicitly ("@everyone").
pub const EVERYONE_ROLE_ID: u64 = 0;

/// KOOK role permission bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RolePermission(u64);

impl RolePermission {
    pub const EMPTY: Self = Self(0);
    pub const ADMIN: Self = Self(1 << 0);
    pub const MANAGE_GUILD: Self = Self(1 << 1);
    pub const VIEW_AUDIT_LOG: Self = Self(1 << 2);
    pub const CREATE_INVITE: Self = Self(1 << 3);
    pub const MANAGE_INVITE: Self = Self(1 << 4);
    pub const MANAGE_CHANNEL: Self = Self(1 << 5);
    pub const KICK_USER: Self = Self(1 << 6);
    pub const BAN_USER: Self = Self(1 << 7);
    pub const MANAGE_GUILD_EMOJI: Self = Self(1 << 8);
    pub const CHANGE_NICKNAME: Self = Self(1 << 9);
    pub const MANAGE_ROLE_PERMISSION: Self = Self(1 << 10);
    pub const VIEW_CHANNEL: Self = Self(1 << 11);
    pub const SEND_MESSAGE: Self = Self(1 << 12);
    pub const MANAGE_MESSAGE: Self = Self(1 << 13);
    pub const UPLOAD_FILE: Self = Self(1 << 14);
    pub const CONNECT_VOICE: Self = Self(1 << 15);
    pub const MANAGE_VOICE: Self = Self(1 << 16);
    pub const MENTION_EVERYONE: Self = Self(1 << 17);
    pub const CREATE_REACTION: Self = Self(1 << 18);
    pub const FOLLOW_REACTION: Self = Self(1 << 19);
    pub const INVITED_TO_VOICE: Self = Self(1 << 20);
    pub const FORCE_MANUAL_VOICE: Self = Self(1 << 21);
    pub const FREE_VOICE: Self = Self(1 << 22);
    pub const VOICE: Self = Self(1 << 23);
    pub const MANAGE_USER_VOICE_RECEIVE: Self = Self(1 << 24);
    pub const MANAGE_USER_VOICE_CREATE: Self = Self(1 << 25);
    pub const MANAGE_NICKNAME: Self = Self(1 << 26);
    pub const PLAY_MUSIC: Self = Self(1 << 27);

    /// Union of every known flag (bits 0 through 27).
    pub const ALL: Self = Self((1 << 28) - 1);

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Drops bits KOOK has not assigned a meaning to.
    pub const fn from_bits_truncate(bits: u64) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for RolePermission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RolePermission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for RolePermission {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for RolePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Computes the effective guild permissions of `user_id`.
///
/// `guild` is `None` when the guild lookup failed, which yields no
/// permissions at all. The owner gets [`RolePermission::ALL`]. Otherwise the
/// implicit everyone role and every listed role are unioned, and the
/// administrator flag expands to [`RolePermission::ALL`].
pub fn member_permissions(guild: Option<&Guild>, user_id: &str, roles: &[u64]) -> RolePermission {
    let Some(guild) = guild else {
        return RolePermission::EMPTY;
    };

    if !guild.master_id.is_empty() && guild.master_id == user_id {
        return RolePermission::ALL;
    }

    let mut perms = RolePermission::EMPTY;
    for role in &guild.roles {
        if role.role_id == EVERYONE_ROLE_ID || roles.contains(&role.role_id) {
            perms |= RolePermission::from_bits_truncate(role.permissions.bits());
        }
    }

    if perms.contains(RolePermission::ADMIN) {
        perms |= RolePermission::ALL;
    }
    perms
}

/// Whether a permission set counts as a group administrator.
pub fn is_guild_admin(perms: RolePermission) -> bool {
    perms.intersects(RolePermission::ADMIN | RolePermission::BAN_USER | RolePermission::KICK_USER)
        || perms == RolePermission::ALL
}

/// Resolves the normalized role of `user_id` inside `guild_id`.
///
/// Any lookup failure resolves to [`GroupRole::Member`].
pub async fn resolve_sender_role(
    transport: &dyn KookTransport,
    guild_id: &str,
    channel_id: &str,
    user_id: &str,
) -> GroupRole {
    let user = match transport.user_view(user_id, guild_id).await {
        Ok(user) => user,
        Err(e) => {
            debug!(guild_id, channel_id, user_id, error = %e, "user lookup failed, treating as member");
            return GroupRole::Member;
        }
    };

    let guild = match transport.guild_view(guild_id).await {
        Ok(guild) => Some(guild),
        Err(e) => {
            debug!(guild_id, channel_id, error = %e, "guild lookup failed");
            None
        }
    };

    let perms = member_permissions(guild.as_ref(), user_id, &user.roles);
    if is_guild_admin(perms) {
        GroupRole::Admin
    } else {
        GroupRole::Member
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn role(role_id: u64, permissions: RolePermission) -> Role {
        Role {
            role_id,
            name: format!("role-{role_id}"),
            permissions,
        }
    }

    fn guild(roles: Vec<Role>) -> Guild {
        Guild {
            id: "g1".into(),
            name: "Tavern".into(),
            master_id: "owner".into(),
            roles,
            channels: vec![],
        }
    }

    #[test]
    fn all_is_union_of_every_flag() {
        let flags = [
            RolePermission::ADMIN,
            RolePermission::MANAGE_GUILD,
            RolePermission::VIEW_AUDIT_LOG,
            RolePermission::CREATE_INVITE,
            RolePermission::MANAGE_INVITE,
            RolePermission::MANAGE_CHANNEL,
            RolePermission::KICK_USER,
            RolePermission::BAN_USER,
            RolePermission::MANAGE_GUILD_EMOJI,
            RolePermission::CHANGE_NICKNAME,
            RolePermission::MANAGE_ROLE_PERMISSION,
            RolePermission::VIEW_CHANNEL,
            RolePermission::SEND_MESSAGE,
            RolePermission::MANAGE_MESSAGE,
            RolePermission::UPLOAD_FILE,
            RolePermission::CONNECT_VOICE,
            RolePermission::MANAGE_VOICE,
            RolePermission::MENTION_EVERYONE,
            RolePermission::CREATE_REACTION,
            RolePermission::FOLLOW_REACTION,
            RolePermission::INVITED_TO_VOICE,
            RolePermission::FORCE_MANUAL_VOICE,
            RolePermission::FREE_VOICE,
            RolePermission::VOICE,
            RolePermission::MANAGE_USER_VOICE_RECEIVE,
            RolePermission::MANAGE_USER_VOICE_CREATE,
            RolePermission::MANAGE_NICKNAME,
            RolePermission::PLAY_MUSIC,
        ];
        let union = flags
            .iter()
            .fold(RolePermission::EMPTY, |acc, flag| acc | *flag);
        assert_eq!(union, RolePermission::ALL);
    }

    #[test]
    fn failed_guild_lookup_is_empty() {
        let perms = member_permissions(None, "owner", &[1, 2, 3]);
        assert!(perms.is_empty());
        assert!(!is_guild_admin(perms));
    }

    #[test]
    fn owner_short_circuits_with_empty_roles() {
        let g = guild(vec![]);
        assert_eq!(member_permissions(Some(&g), "owner", &[]), RolePermission::ALL);
    }

    #[test]
    fn admin_role_implies_all() {
        let g = guild(vec![role(7, RolePermission::ADMIN)]);
        let perms = member_permissions(Some(&g), "alice", &[7]);
        assert_eq!(perms, RolePermission::ALL);
        assert!(is_guild_admin(perms));
    }

    #[test]
    fn unknown_bits_are_dropped() {
        let g = guild(vec![role(
            3,
            RolePermission(RolePermission::SEND_MESSAGE.bits() | (1 << 40)),
        )]);
        assert_eq!(
            member_permissions(Some(&g), "alice", &[3]),
            RolePermission::SEND_MESSAGE
        );
    }

    #[test]
    fn everyone_role_applies_without_being_listed() {
        let g = guild(vec![
            role(EVERYONE_ROLE_ID, RolePermission::SEND_MESSAGE | RolePermission::VIEW_CHANNEL),
            role(5, RolePermission::UPLOAD_FILE),
        ]);
        let perms = member_permissions(Some(&g), "alice", &[]);
        assert_eq!(perms, RolePermission::SEND_MESSAGE | RolePermission::VIEW_CHANNEL);
        assert!(!is_guild_admin(perms));
    }

    #[test]
    fn unlisted_roles_do_not_apply() {
        let g = guild(vec![role(9, RolePermission::BAN_USER)]);
        assert!(member_permissions(Some(&g), "alice", &[8]).is_empty());
    }

    #[test]
    fn kick_or_ban_counts_as_admin() {
        assert!(is_guild_admin(RolePermission::KICK_USER));
        assert!(is_guild_admin(RolePermission::BAN_USER | RolePermission::SEND_MESSAGE));
        assert!(!is_guild_admin(RolePermission::MANAGE_MESSAGE));
    }

    #[test]
    fn roles_are_unioned() {
        let g = guild(vec![
            role(1, RolePermission::SEND_MESSAGE),
            role(2, RolePermission::MANAGE_MESSAGE),
        ]);
        assert_eq!(
            member_permissions(Some(&g), "alice", &[1, 2]),
            RolePermission::SEND_MESSAGE | RolePermission::MANAGE_MESSAGE
        );
    }
}
