// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The remote capability the adapter drives.
//!
//! [`KookTransport`] is the seam between the adapter's lifecycle logic and
//! the platform's wire protocol. [`crate::http::HttpTransport`] is the real
//! implementation; tests substitute an in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::KookError;
use crate::model::{Channel, Guild, KookEvent, User, UserChat};

/// How long [`GatewayLink::close`] waits for the reader task to exit.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// A live gateway connection.
///
/// The reader task pushes events into the channel handed to
/// [`KookTransport::connect`] and drops its sender when the connection ends,
/// whether it was closed deliberately or lost.
#[derive(Debug)]
pub struct GatewayLink {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl GatewayLink {
    pub fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { cancel, task }
    }

    /// Token cancelled when the link is closed on purpose.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_alive(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }

    /// Cancels the reader and waits briefly for it to finish.
    pub async fn close(self) {
        self.cancel.cancel();
        let abort = self.task.abort_handle();
        if tokio::time::timeout(CLOSE_GRACE, self.task).await.is_err() {
            warn!("gateway reader did not stop in time, aborting");
            abort.abort();
        }
    }
}

#[async_trait]
pub trait KookTransport: Send + Sync + 'static {
    /// Opens the gateway and completes the hello handshake.
    async fn connect(&self, events: mpsc::Sender<KookEvent>) -> Result<GatewayLink, KookError>;

    /// The bot account itself.
    async fn user_me(&self) -> Result<User, KookError>;

    /// A user as seen inside `guild_id` (roles are only populated with a guild).
    async fn user_view(&self, user_id: &str, guild_id: &str) -> Result<User, KookError>;

    async fn guild_view(&self, guild_id: &str) -> Result<Guild, KookError>;

    /// Every guild the bot has joined, across all pages.
    async fn guild_list(&self) -> Result<Vec<Guild>, KookError>;

    async fn channel_view(&self, channel_id: &str) -> Result<Channel, KookError>;

    async fn user_chat_create(&self, user_id: &str) -> Result<UserChat, KookError>;

    async fn direct_message_create(&self, chat_code: &str, content: &str) -> Result<(), KookError>;

    /// Sends a plain text message into a channel.
    async fn message_create(&self, channel_id: &str, content: &str) -> Result<(), KookError>;

    async fn guild_leave(&self, guild_id: &str) -> Result<(), KookError>;

    async fn guild_nickname(&self, guild_id: &str, user_id: &str, nickname: &str) -> Result<(), KookError>;

    /// Shows "playing <game>" on the bot's profile.
    async fn game_activity(&self, game_id: i64) -> Result<(), KookError>;
}
