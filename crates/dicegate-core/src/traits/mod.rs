// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams of the gateway: platform adapters, the dispatch pipeline,
//! "message sent" observers, and session persistence.
//!
//! Async traits use `#[async_trait]` so they stay object-safe.

pub mod adapter;
pub mod dispatch;
pub mod storage;

pub use adapter::PlatformAdapter;
pub use dispatch::{MessageDispatcher, MessageSentHook};
pub use storage::{SessionSnapshot, SessionStore};
