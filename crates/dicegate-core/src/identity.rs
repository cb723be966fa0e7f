// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-qualified identifier namespacing.
//!
//! Canonical ids are a literal prefix followed by the platform-native id:
//! `KOOK:<user>` for users and `KOOK-CH-Group:<channel>` for groups. The
//! formats are persisted by downstream collaborators and must stay
//! byte-for-byte stable.

use crate::types::Platform;

/// One encode/decode pair keyed by a literal prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdNamespace {
    prefix: &'static str,
}

impl IdNamespace {
    pub const fn new(prefix: &'static str) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    /// Builds the canonical id for a native id.
    pub fn encode(&self, native_id: &str) -> String {
        format!("{}{}", self.prefix, native_id)
    }

    /// Strips the namespace prefix if present, otherwise returns the input.
    ///
    /// Native ids never start with a platform prefix, so decoding an
    /// already-bare id is a no-op.
    pub fn decode<'a>(&self, id: &'a str) -> &'a str {
        id.strip_prefix(self.prefix).unwrap_or(id)
    }

    /// Returns true when `id` is in this namespace.
    pub fn owns(&self, id: &str) -> bool {
        id.starts_with(self.prefix)
    }
}

/// The user and group namespaces of one platform. They are disjoint even
/// within a single platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformIds {
    pub user: IdNamespace,
    pub group: IdNamespace,
}

pub const KOOK_IDS: PlatformIds = PlatformIds {
    user: IdNamespace::new("KOOK:"),
    group: IdNamespace::new("KOOK-CH-Group:"),
};

impl Platform {
    /// Identifier namespaces for this platform.
    pub fn ids(self) -> &'static PlatformIds {
        match self {
            Platform::Kook => &KOOK_IDS,
        }
    }
}
