// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability set every platform adapter implements.

use async_trait::async_trait;

use crate::error::DicegateError;
use crate::lifecycle::EndpointCell;
use crate::types::{MsgContext, Platform};

/// One platform connection, translated into the canonical model.
///
/// Each implementation owns its native transport handle exclusively. The
/// orchestrator and the session only ever call through this trait.
///
/// Outbound operations never return errors: transport faults are logged with
/// the operation and target id and the call returns without effect.
#[async_trait]
pub trait PlatformAdapter: Send + Sync + 'static {
    /// The platform tag of this adapter.
    fn platform(&self) -> Platform;

    /// Lifecycle record of the endpoint this adapter serves.
    fn endpoint(&self) -> &EndpointCell;

    /// Establishes the connection and registers the inbound handler.
    ///
    /// Blocks on the initial handshake only. On success the endpoint is
    /// connected and enabled with its nickname and canonical user id filled
    /// in; on failure the error is logged, the endpoint is left disconnected
    /// and disabled, and no retry is attempted.
    async fn serve(&self) -> Result<(), DicegateError>;

    /// Idempotent enable/disable toggle.
    ///
    /// Enabling never opens a second connection. Disabling closes and
    /// releases the connection and is safe to call repeatedly.
    async fn set_enabled(&self, enable: bool);

    /// Tears the connection down and re-establishes it.
    async fn reconnect(&self) -> bool;

    /// Sends `text` to a user identified by canonical user id.
    async fn send_to_user(&self, ctx: &MsgContext, user_id: &str, text: &str, flag: &str);

    /// Sends `text` to a group identified by canonical group id.
    async fn send_to_group(&self, ctx: &MsgContext, group_id: &str, text: &str, flag: &str);

    /// Leaves the container that owns the group.
    async fn leave_group(&self, ctx: &MsgContext, group_id: &str);

    /// Renames a member inside the container that owns the group.
    async fn set_member_display_name(&self, group_id: &str, user_id: &str, name: &str);

    /// Best-effort, non-blocking group name refresh.
    ///
    /// Spawns a detached task and returns immediately. On success the shared
    /// group name cache and any tracked group record are updated; failures
    /// are logged and leave the cache untouched.
    fn fetch_group_info_async(&self, group_id: &str);

    /// Closes the connection during process cleanup without recording an
    /// operator disable.
    async fn shutdown(&self);
}
