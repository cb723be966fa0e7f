// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Explicit dependency bundle handed to adapters at construction.
//!
//! Adapters never hold a reference back to their session; they get this
//! context instead. Every field is reference-counted, so cloning is cheap.

use std::sync::Arc;

use crate::group::{GroupNameCache, GroupRegistry};
use crate::hooks::HookRegistry;
use crate::traits::MessageDispatcher;

#[derive(Clone)]
pub struct SessionContext {
    name: Arc<str>,
    dispatcher: Arc<dyn MessageDispatcher>,
    hooks: Arc<HookRegistry>,
    group_names: Arc<GroupNameCache>,
    groups: Arc<GroupRegistry>,
}

impl SessionContext {
    /// Creates a context with its own hooks, group name cache, and registry.
    pub fn new(name: impl Into<String>, dispatcher: Arc<dyn MessageDispatcher>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            dispatcher,
            hooks: Arc::new(HookRegistry::new()),
            group_names: Arc::new(GroupNameCache::new()),
            groups: Arc::new(GroupRegistry::new()),
        }
    }

    /// Shares an existing group name cache (e.g. one cache across sessions).
    pub fn with_group_names(mut self, cache: Arc<GroupNameCache>) -> Self {
        self.group_names = cache;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatcher(&self) -> &Arc<dyn MessageDispatcher> {
        &self.dispatcher
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn group_names(&self) -> &GroupNameCache {
        &self.group_names
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("name", &self.name)
            .field("hooks", &self.hooks)
            .field("group_names", &self.group_names.len())
            .finish()
    }
}
