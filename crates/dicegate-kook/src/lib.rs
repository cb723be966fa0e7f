// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KOOK platform adapter for the Dicegate gateway.
//!
//! Implements [`PlatformAdapter`] on top of a [`KookTransport`]: the gateway
//! pushes events into a channel drained by a per-connection pump task, which
//! filters and normalizes them before handing them to the session's
//! dispatcher. Outbound calls go through the REST API.

pub mod error;
pub mod handler;
pub mod http;
pub mod model;
pub mod permission;
pub mod transport;

#[cfg(test)]
mod mock;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use async_trait::async_trait;
use dicegate_config::model::KookEndpointConfig;
use dicegate_core::{
    CanonicalMessage, DicegateError, EndpointCell, GroupRole, KOOK_IDS, LifecycleEvent,
    MessageKind, MsgContext, Platform, PlatformAdapter, SessionContext,
};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use error::KookError;
pub use http::HttpTransport;
pub use model::KookEvent;
pub use transport::{GatewayLink, KookTransport};

/// Game id shown as the bot's activity after connecting.
pub const PRESENCE_GAME_ID: i64 = 768222;

/// Cached group names older than this are refetched when a group event arrives.
pub const GROUP_NAME_MAX_AGE_SECS: i64 = 3600;

const EVENT_BUFFER: usize = 256;

/// KOOK adapter bound to one endpoint.
///
/// Cheap to clone; clones share the connection and endpoint record.
#[derive(Clone)]
pub struct KookAdapter {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn KookTransport>,
    endpoint: EndpointCell,
    ctx: SessionContext,
    link: Mutex<Option<GatewayLink>>,
}

impl KookAdapter {
    pub fn new(transport: Arc<dyn KookTransport>, endpoint: EndpointCell, ctx: SessionContext) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                endpoint,
                ctx,
                link: Mutex::new(None),
            }),
        }
    }

    /// Creates an adapter talking to the real KOOK API.
    pub fn from_config(
        config: &KookEndpointConfig,
        endpoint: EndpointCell,
        ctx: SessionContext,
    ) -> Result<Self, DicegateError> {
        let transport = HttpTransport::new(&config.token, &config.api_base)?;
        Ok(Self::new(Arc::new(transport), endpoint, ctx))
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.ctx
    }

    fn transport(&self) -> &dyn KookTransport {
        self.inner.transport.as_ref()
    }

    /// Applies the filters and builds the canonical message, resolving the
    /// sender's role for group messages.
    async fn normalize(&self, event: &KookEvent, self_id: &str) -> Option<CanonicalMessage> {
        let endpoint = self.inner.endpoint.id();
        if !handler::is_supported(event) {
            debug!(%endpoint, message_type = event.message_type, "dropping unsupported KOOK event");
            return None;
        }
        if handler::is_self_authored(event, self_id) {
            debug!(%endpoint, author_id = %event.author_id, "dropping self-authored KOOK event");
            return None;
        }

        let role = if event.is_private() {
            GroupRole::Member
        } else {
            permission::resolve_sender_role(
                self.transport(),
                &event.extra.guild_id,
                &event.target_id,
                &event.author_id,
            )
            .await
        };
        Some(handler::to_canonical(event, role))
    }

    async fn handle_event(&self, event: KookEvent, self_id: &str) {
        let Some(message) = self.normalize(&event, self_id).await else {
            return;
        };
        if message.kind == MessageKind::Group {
            self.refresh_group_name_if_stale(&message.group_id);
        }
        let status = self.inner.endpoint.status();
        let dispatcher = self.inner.ctx.dispatcher();
        let raw_id = message.raw_id.clone();
        if catch_unwind(AssertUnwindSafe(|| dispatcher.execute(&status, message))).is_err() {
            error!(endpoint = %status.id, msg_id = %raw_id, "dispatcher panicked while handling KOOK message");
        }
    }

    /// Drains the connection's event channel until the link is closed or lost.
    fn spawn_pump(&self, mut events: mpsc::Receiver<KookEvent>, cancel: CancellationToken, self_id: String) {
        let adapter = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = events.recv() => match next {
                        Some(event) => adapter.handle_event(event, &self_id).await,
                        None => {
                            if !cancel.is_cancelled() {
                                warn!(
                                    endpoint = %adapter.inner.endpoint.id(),
                                    "KOOK gateway connection lost"
                                );
                                adapter.inner.endpoint.apply(LifecycleEvent::TransportLost);
                            }
                            break;
                        }
                    },
                }
            }
        });
    }

    fn spawn_after_connect(&self) {
        let adapter = self.clone();
        tokio::spawn(async move { adapter.update_presence().await });
        self.spawn_group_count_refresh();
    }

    fn spawn_group_count_refresh(&self) {
        let adapter = self.clone();
        tokio::spawn(async move { adapter.refresh_group_count().await });
    }

    async fn update_presence(&self) {
        if let Err(e) = self.transport().game_activity(PRESENCE_GAME_ID).await {
            error!(endpoint = %self.inner.endpoint.id(), error = %e, "failed to update KOOK game activity");
        }
    }

    /// Counts the channels of every joined guild into the endpoint's `group_num`.
    async fn refresh_group_count(&self) {
        let endpoint = self.inner.endpoint.id();
        let guilds = match self.transport().guild_list().await {
            Ok(guilds) => guilds,
            Err(e) => {
                warn!(%endpoint, error = %e, "failed to list KOOK guilds");
                return;
            }
        };

        let mut total: i64 = 0;
        for guild in guilds {
            let channels = if guild.channels.is_empty() {
                match self.transport().guild_view(&guild.id).await {
                    Ok(full) => full.channels.len(),
                    Err(e) => {
                        debug!(%endpoint, guild_id = %guild.id, error = %e, "failed to view KOOK guild");
                        0
                    }
                }
            } else {
                guild.channels.len()
            };
            total += channels as i64;
        }
        self.inner.endpoint.set_group_num(total);
        debug!(%endpoint, group_num = total, "refreshed KOOK group count");
    }

    fn refresh_group_name_if_stale(&self, group_id: &str) {
        let now = chrono::Utc::now().timestamp();
        if self
            .inner
            .ctx
            .group_names()
            .needs_refresh(group_id, now, GROUP_NAME_MAX_AGE_SECS)
        {
            debug!(group_id, "group name unknown or stale, refreshing");
            self.fetch_group_info_async(group_id);
        }
    }

    async fn fetch_group_info(&self, group_id: &str) {
        let channel_id = KOOK_IDS.group.decode(group_id);
        match self.transport().channel_view(channel_id).await {
            Ok(channel) => {
                let now = chrono::Utc::now().timestamp();
                self.inner.ctx.group_names().set(group_id, channel.name.clone(), now);
                if self.inner.ctx.groups().rename(group_id, &channel.name) {
                    debug!(group_id, name = %channel.name, "tracked group renamed");
                }
            }
            Err(e) => error!(group_id, error = %e, "failed to fetch KOOK channel info"),
        }
    }
}

#[async_trait]
impl PlatformAdapter for KookAdapter {
    fn platform(&self) -> Platform {
        Platform::Kook
    }

    fn endpoint(&self) -> &EndpointCell {
        &self.inner.endpoint
    }

    async fn serve(&self) -> Result<(), DicegateError> {
        let endpoint = &self.inner.endpoint;
        let mut link = self.inner.link.lock().await;
        if link.as_ref().is_some_and(GatewayLink::is_alive) {
            debug!(endpoint = %endpoint.id(), "KOOK endpoint already connected");
            return Ok(());
        }
        if let Some(stale) = link.take() {
            stale.close().await;
        }

        endpoint.apply(LifecycleEvent::ConnectStarted);
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let gateway = match self.transport().connect(tx).await {
            Ok(gateway) => gateway,
            Err(e) => {
                error!(endpoint = %endpoint.id(), error = %e, "failed to connect to KOOK");
                endpoint.apply(LifecycleEvent::ConnectFailed);
                return Err(e.into());
            }
        };

        let me = match self.transport().user_me().await {
            Ok(me) => me,
            Err(e) => {
                error!(endpoint = %endpoint.id(), error = %e, "failed to fetch KOOK bot account");
                gateway.close().await;
                endpoint.apply(LifecycleEvent::ConnectFailed);
                return Err(e.into());
            }
        };

        let nickname = me.display_name().to_string();
        let user_id = KOOK_IDS.user.encode(&me.id);
        endpoint.apply(LifecycleEvent::ConnectSucceeded {
            nickname: nickname.clone(),
            user_id: user_id.clone(),
        });
        self.spawn_pump(rx, gateway.cancel_token(), me.id);
        *link = Some(gateway);
        drop(link);

        info!(endpoint = %endpoint.id(), %nickname, %user_id, "KOOK connection established");
        self.spawn_after_connect();
        Ok(())
    }

    async fn set_enabled(&self, enable: bool) {
        let endpoint = &self.inner.endpoint;
        if enable {
            info!(endpoint = %endpoint.id(), "enabling KOOK endpoint");
            if let Err(e) = self.serve().await {
                debug!(endpoint = %endpoint.id(), error = %e, "enable left the endpoint disconnected");
            }
            return;
        }

        let mut link = self.inner.link.lock().await;
        let Some(gateway) = link.take() else {
            debug!(endpoint = %endpoint.id(), "KOOK endpoint has no connection to disable");
            return;
        };
        endpoint.apply(LifecycleEvent::Disabled);
        gateway.close().await;
        info!(endpoint = %endpoint.id(), "KOOK endpoint disabled");
    }

    async fn reconnect(&self) -> bool {
        let endpoint = &self.inner.endpoint;
        info!(endpoint = %endpoint.id(), "reconnecting to KOOK");
        {
            let mut link = self.inner.link.lock().await;
            endpoint.apply(LifecycleEvent::Disabled);
            if let Some(gateway) = link.take() {
                gateway.close().await;
            }
        }
        self.serve().await.is_ok()
    }

    async fn send_to_user(&self, ctx: &MsgContext, user_id: &str, text: &str, flag: &str) {
        let native = KOOK_IDS.user.decode(user_id);
        let chat = match self.transport().user_chat_create(native).await {
            Ok(chat) => chat,
            Err(e) => {
                error!(user_id, error = %e, "failed to open KOOK private chat");
                return;
            }
        };
        if let Err(e) = self.transport().direct_message_create(&chat.code, text).await {
            error!(user_id, error = %e, "failed to send KOOK direct message");
            return;
        }
        self.inner
            .ctx
            .hooks()
            .notify(ctx, MessageKind::Private, user_id, text, flag);
    }

    async fn send_to_group(&self, ctx: &MsgContext, group_id: &str, text: &str, flag: &str) {
        let channel_id = KOOK_IDS.group.decode(group_id);
        if let Err(e) = self.transport().message_create(channel_id, text).await {
            error!(group_id, error = %e, "failed to send KOOK channel message");
            return;
        }
        self.inner
            .ctx
            .hooks()
            .notify(ctx, MessageKind::Group, group_id, text, flag);
    }

    async fn leave_group(&self, _ctx: &MsgContext, group_id: &str) {
        let channel_id = KOOK_IDS.group.decode(group_id);
        let channel = match self.transport().channel_view(channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(group_id, error = %e, "failed to fetch KOOK channel info");
                return;
            }
        };
        match self.transport().guild_leave(&channel.guild_id).await {
            Ok(()) => info!(group_id, guild_id = %channel.guild_id, "left KOOK guild"),
            Err(e) => error!(group_id, guild_id = %channel.guild_id, error = %e, "failed to leave KOOK guild"),
        }
    }

    async fn set_member_display_name(&self, group_id: &str, user_id: &str, name: &str) {
        let channel_id = KOOK_IDS.group.decode(group_id);
        let channel = match self.transport().channel_view(channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(group_id, error = %e, "failed to fetch KOOK channel info");
                return;
            }
        };
        let native_user = KOOK_IDS.user.decode(user_id);
        if let Err(e) = self
            .transport()
            .guild_nickname(&channel.guild_id, native_user, name)
            .await
        {
            error!(
                group_id,
                user_id,
                guild_id = %channel.guild_id,
                error = %e,
                "failed to set KOOK guild nickname"
            );
        }
    }

    fn fetch_group_info_async(&self, group_id: &str) {
        self.spawn_group_count_refresh();
        let adapter = self.clone();
        let group_id = group_id.to_string();
        tokio::spawn(async move { adapter.fetch_group_info(&group_id).await });
    }

    async fn shutdown(&self) {
        let mut link = self.inner.link.lock().await;
        if let Some(gateway) = link.take() {
            gateway.close().await;
            self.inner.endpoint.apply(LifecycleEvent::TransportLost);
            debug!(endpoint = %self.inner.endpoint.id(), "KOOK connection closed for shutdown");
        }
    }
}
