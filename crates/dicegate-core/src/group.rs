// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared group state: the group name cache and the tracked-group registry.
//!
//! Both maps are keyed by canonical group id and are shared by every
//! endpoint of a session. Writes go through `DashMap`, so concurrent refreshes
//! for different groups never contend on a single lock and two writers of the
//! same key are serialized.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A cached group name and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNameEntry {
    pub name: String,
    /// Unix time (seconds) of the last successful refresh.
    pub last_updated: i64,
}

/// Canonical group id -> display name. Never evicted by the core.
#[derive(Debug, Default)]
pub struct GroupNameCache {
    entries: DashMap<String, GroupNameEntry>,
}

impl GroupNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, group_id: &str, name: impl Into<String>, now_unix: i64) {
        self.entries.insert(
            group_id.to_string(),
            GroupNameEntry {
                name: name.into(),
                last_updated: now_unix,
            },
        );
    }

    pub fn get(&self, group_id: &str) -> Option<GroupNameEntry> {
        self.entries.get(group_id).map(|e| e.value().clone())
    }

    /// True when the group is unknown or its entry is older than `max_age_secs`.
    pub fn needs_refresh(&self, group_id: &str, now_unix: i64, max_age_secs: i64) -> bool {
        match self.entries.get(group_id) {
            Some(entry) => now_unix.saturating_sub(entry.last_updated) > max_age_secs,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies every entry out, sorted by group id.
    pub fn snapshot(&self) -> Vec<(String, GroupNameEntry)> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Loads previously persisted entries, keeping any newer in-memory entry.
    pub fn restore(&self, entries: impl IntoIterator<Item = (String, GroupNameEntry)>) {
        for (id, entry) in entries {
            self.entries
                .entry(id)
                .and_modify(|cur| {
                    if entry.last_updated > cur.last_updated {
                        *cur = entry.clone();
                    }
                })
                .or_insert(entry);
        }
    }
}

/// In-memory record of a group the session is currently serving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub group_name: String,
    pub active: bool,
}

/// Groups currently tracked by a session, keyed by canonical group id.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: DashMap<String, GroupRecord>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, group_id: &str, record: GroupRecord) {
        self.groups.insert(group_id.to_string(), record);
    }

    pub fn get(&self, group_id: &str) -> Option<GroupRecord> {
        self.groups.get(group_id).map(|g| g.value().clone())
    }

    pub fn is_tracked(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    /// Updates the name of a tracked group. Returns false if it is not tracked.
    pub fn rename(&self, group_id: &str, name: &str) -> bool {
        match self.groups.get_mut(group_id) {
            Some(mut record) => {
                record.group_name = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn untrack(&self, group_id: &str) -> Option<GroupRecord> {
        self.groups.remove(group_id).map(|(_, record)| record)
    }
}
