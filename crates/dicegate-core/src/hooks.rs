// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered registry of "message sent" observers.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::error;

use crate::traits::MessageSentHook;
use crate::types::{MessageKind, MsgContext};

/// Hooks fire in registration order, once per successful send.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn MessageSentHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hook: Arc<dyn MessageSentHook>) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every hook in order.
    ///
    /// A panicking hook is logged and skipped; the remaining hooks still run.
    pub fn notify(&self, ctx: &MsgContext, kind: MessageKind, target_id: &str, text: &str, flag: &str) {
        // Snapshot so hooks may register further hooks without deadlocking.
        let hooks = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for hook in hooks {
            let result = catch_unwind(AssertUnwindSafe(|| {
                hook.on_message_sent(ctx, kind, target_id, text, flag);
            }));
            if result.is_err() {
                error!(
                    hook = hook.name(),
                    target_id,
                    kind = %kind,
                    "message sent hook panicked"
                );
            }
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry").field("len", &self.len()).finish()
    }
}
