// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`KookTransport`] for adapter tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::KookError;
use crate::model::{Channel, EventExtra, Guild, KookEvent, User, UserChat};
use crate::transport::{GatewayLink, KookTransport};

#[derive(Default)]
struct State {
    connects: usize,
    fail_connect: bool,
    fail_sends: bool,
    presence_updates: usize,
    users: HashMap<String, User>,
    guilds: Vec<Guild>,
    channels: HashMap<String, Channel>,
    sender: Option<mpsc::Sender<KookEvent>>,
    lost: Option<CancellationToken>,
    calls: Vec<String>,
}

/// Scriptable transport. The bot account is always `1000` / `DiceBot`.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn connects(&self) -> usize {
        self.with(|s| s.connects)
    }

    pub fn presence_updates(&self) -> usize {
        self.with(|s| s.presence_updates)
    }

    /// Mutating REST calls, in order.
    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn fail_connect(&self, fail: bool) {
        self.with(|s| s.fail_connect = fail);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.with(|s| s.fail_sends = fail);
    }

    pub fn add_user(&self, user: User) {
        self.with(|s| s.users.insert(user.id.clone(), user));
    }

    pub fn add_guild(&self, guild: Guild) {
        self.with(|s| s.guilds.push(guild));
    }

    pub fn add_channel(&self, channel: Channel) {
        self.with(|s| s.channels.insert(channel.id.clone(), channel));
    }

    /// Pushes an event through the current gateway connection.
    pub async fn emit(&self, event: KookEvent) {
        let sender = self.with(|s| s.sender.clone()).expect("not connected");
        sender.send(event).await.expect("event pump gone");
    }

    /// Simulates the server dropping the connection.
    pub fn drop_connection(&self) {
        self.with(|s| {
            s.sender = None;
            if let Some(lost) = s.lost.take() {
                lost.cancel();
            }
        });
    }

    fn send_result(&self, call: String) -> Result<(), KookError> {
        self.with(|s| {
            if s.fail_sends {
                Err(KookError::Gateway("send refused".into()))
            } else {
                s.calls.push(call);
                Ok(())
            }
        })
    }
}

fn not_found(what: &str, id: &str) -> KookError {
    KookError::Api {
        endpoint: what.into(),
        code: 40000,
        message: format!("{id} not found"),
    }
}

#[async_trait]
impl KookTransport for MockTransport {
    async fn connect(&self, events: mpsc::Sender<KookEvent>) -> Result<GatewayLink, KookError> {
        let cancel = CancellationToken::new();
        let lost = CancellationToken::new();
        self.with(|s| {
            if s.fail_connect {
                return Err(KookError::Gateway("connection refused".into()));
            }
            s.connects += 1;
            s.sender = Some(events);
            s.lost = Some(lost.clone());
            Ok(())
        })?;

        let closed = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = closed.cancelled() => {}
                _ = lost.cancelled() => {}
            }
        });
        Ok(GatewayLink::new(cancel, task))
    }

    async fn user_me(&self) -> Result<User, KookError> {
        Ok(User {
            id: "1000".into(),
            username: "dicebot".into(),
            nickname: "DiceBot".into(),
            bot: true,
            roles: vec![],
        })
    }

    async fn user_view(&self, user_id: &str, _guild_id: &str) -> Result<User, KookError> {
        self.with(|s| s.users.get(user_id).cloned())
            .ok_or_else(|| not_found("user/view", user_id))
    }

    async fn guild_view(&self, guild_id: &str) -> Result<Guild, KookError> {
        self.with(|s| s.guilds.iter().find(|g| g.id == guild_id).cloned())
            .ok_or_else(|| not_found("guild/view", guild_id))
    }

    async fn guild_list(&self) -> Result<Vec<Guild>, KookError> {
        Ok(self.with(|s| s.guilds.clone()))
    }

    async fn channel_view(&self, channel_id: &str) -> Result<Channel, KookError> {
        self.with(|s| s.channels.get(channel_id).cloned())
            .ok_or_else(|| not_found("channel/view", channel_id))
    }

    async fn user_chat_create(&self, user_id: &str) -> Result<UserChat, KookError> {
        self.send_result(format!("user_chat_create {user_id}"))?;
        Ok(UserChat {
            code: format!("chat-{user_id}"),
        })
    }

    async fn direct_message_create(&self, chat_code: &str, content: &str) -> Result<(), KookError> {
        self.send_result(format!("direct_message_create {chat_code} {content}"))
    }

    async fn message_create(&self, channel_id: &str, content: &str) -> Result<(), KookError> {
        self.send_result(format!("message_create {channel_id} {content}"))
    }

    async fn guild_leave(&self, guild_id: &str) -> Result<(), KookError> {
        self.send_result(format!("guild_leave {guild_id}"))
    }

    async fn guild_nickname(&self, guild_id: &str, user_id: &str, nickname: &str) -> Result<(), KookError> {
        self.send_result(format!("guild_nickname {guild_id} {user_id} {nickname}"))
    }

    async fn game_activity(&self, _game_id: i64) -> Result<(), KookError> {
        self.with(|s| s.presence_updates += 1);
        Ok(())
    }
}

fn author(id: &str) -> User {
    User {
        id: id.into(),
        username: format!("user{id}"),
        nickname: String::new(),
        bot: false,
        roles: vec![],
    }
}

pub fn private_message(author_id: &str, content: &str) -> KookEvent {
    KookEvent {
        channel_type: "PERSON".into(),
        message_type: 1,
        target_id: "1000".into(),
        author_id: author_id.into(),
        content: content.into(),
        msg_id: format!("msg-{author_id}"),
        msg_timestamp: 1_700_000_000_000,
        extra: EventExtra {
            guild_id: String::new(),
            channel_name: String::new(),
            author: Some(author(author_id)),
        },
    }
}

pub fn guild_message(guild_id: &str, channel_id: &str, author_id: &str, content: &str) -> KookEvent {
    KookEvent {
        channel_type: "GROUP".into(),
        message_type: 9,
        target_id: channel_id.into(),
        author_id: author_id.into(),
        content: content.into(),
        msg_id: format!("msg-{author_id}"),
        msg_timestamp: 1_700_000_000_000,
        extra: EventExtra {
            guild_id: guild_id.into(),
            channel_name: "dice".into(),
            author: Some(author(author_id)),
        },
    }
}
