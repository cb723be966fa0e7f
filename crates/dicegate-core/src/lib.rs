// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dicegate platform gateway.
//!
//! This crate provides the canonical message and identity model, the endpoint
//! lifecycle state machine, the shared group caches, and the trait seams that
//! every platform adapter and collaborator implements.

pub mod context;
pub mod error;
pub mod group;
pub mod hooks;
pub mod identity;
pub mod lifecycle;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use context::SessionContext;
pub use error::DicegateError;
pub use group::{GroupNameCache, GroupNameEntry, GroupRecord, GroupRegistry};
pub use hooks::HookRegistry;
pub use identity::{IdNamespace, KOOK_IDS, PlatformIds};
pub use lifecycle::{ConnectionState, EndpointCell, EndpointStatus, LifecycleEvent};
pub use types::{CanonicalMessage, EndpointId, GroupRole, MessageKind, MsgContext, Platform, Sender};

pub use traits::{MessageDispatcher, MessageSentHook, PlatformAdapter, SessionSnapshot, SessionStore};
