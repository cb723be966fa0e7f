// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! KOOK transport over the v3 REST API and the websocket gateway.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::KookError;
use crate::model::{
    Channel, Envelope, GatewayIndex, Guild, KookEvent, MessageReceipt, Page, User, UserChat,
    MESSAGE_TYPE_TEXT,
};
use crate::transport::{GatewayLink, KookTransport};

/// Default REST base URL.
pub const API_BASE_URL: &str = "https://www.kookapp.cn/api/v3";

const HELLO_TIMEOUT: Duration = Duration::from_secs(6);
const PING_INTERVAL: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const GUILD_PAGE_SIZE: &str = "50";

const SIGNAL_EVENT: u8 = 0;
const SIGNAL_HELLO: u8 = 1;
const SIGNAL_PING: u8 = 2;
const SIGNAL_PONG: u8 = 3;
const SIGNAL_RECONNECT: u8 = 5;
const SIGNAL_RESUME_ACK: u8 = 6;

/// One websocket frame of the gateway protocol.
#[derive(Debug, Deserialize)]
struct Frame {
    s: u8,
    #[serde(default)]
    d: serde_json::Value,
    #[serde(default)]
    sn: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Hello {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    session_id: String,
}

/// REST + gateway client for one bot token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport authenticated with `token`.
    pub fn new(token: &str, base_url: &str) -> Result<Self, KookError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(KookError::Config("KOOK token cannot be empty".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bot {token}"))
                .map_err(|e| KookError::Config(format!("invalid token header value: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| KookError::Http {
                endpoint: "<client>".into(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> Result<reqwest::Url, KookError> {
        reqwest::Url::parse(&format!("{}/{endpoint}", self.base_url))
            .map_err(|e| KookError::Config(format!("invalid KOOK API base `{}`: {e}", self.base_url)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, KookError> {
        let mut url = self.url(endpoint)?;
        url.query_pairs_mut().extend_pairs(params.iter());
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| KookError::Http {
                endpoint: endpoint.into(),
                source,
            })?;
        require_data(endpoint, read_envelope(endpoint, response).await?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<Envelope<T>, KookError> {
        let response = self
            .client
            .post(self.url(endpoint)?)
            .json(&body)
            .send()
            .await
            .map_err(|source| KookError::Http {
                endpoint: endpoint.into(),
                source,
            })?;
        read_envelope(endpoint, response).await
    }

    async fn gateway_url(&self) -> Result<String, KookError> {
        let index: GatewayIndex = self.get("gateway/index", &[("compress", "0")]).await?;
        Ok(index.url)
    }
}

async fn read_envelope<T: DeserializeOwned>(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<Envelope<T>, KookError> {
    let status = response.status();
    let body = response.text().await.map_err(|source| KookError::Http {
        endpoint: endpoint.into(),
        source,
    })?;

    // Error replies carry `data: {}` or `[]`, so `code` is checked before
    // `data` is decoded as `T`.
    let raw: Envelope<serde_json::Value> = match serde_json::from_str(&body) {
        Ok(raw) => raw,
        Err(_) if !status.is_success() => {
            return Err(KookError::Api {
                endpoint: endpoint.into(),
                code: i64::from(status.as_u16()),
                message: body,
            });
        }
        Err(e) => return Err(KookError::Decode(e)),
    };

    if raw.code != 0 {
        return Err(KookError::Api {
            endpoint: endpoint.into(),
            code: raw.code,
            message: raw.message,
        });
    }
    let data = match raw.data {
        Some(serde_json::Value::Null) | None => None,
        Some(value) => Some(serde_json::from_value(value)?),
    };
    debug!(endpoint, "KOOK API call succeeded");
    Ok(Envelope {
        code: raw.code,
        message: raw.message,
        data,
    })
}

fn require_data<T>(endpoint: &str, envelope: Envelope<T>) -> Result<T, KookError> {
    envelope.data.ok_or_else(|| KookError::Api {
        endpoint: endpoint.into(),
        code: 0,
        message: "response carried no data".into(),
    })
}

#[async_trait]
impl KookTransport for HttpTransport {
    async fn connect(&self, events: mpsc::Sender<KookEvent>) -> Result<GatewayLink, KookError> {
        let url = self.gateway_url().await?;
        let (mut ws, _response) = connect_async(url.as_str()).await?;

        let hello = match tokio::time::timeout(HELLO_TIMEOUT, ws.next()).await {
            Err(_) => return Err(KookError::HandshakeTimeout(HELLO_TIMEOUT)),
            Ok(None) => return Err(KookError::Gateway("connection closed before hello".into())),
            Ok(Some(message)) => parse_frame(message?)?,
        };
        match hello {
            Some(Frame { s: SIGNAL_HELLO, d, .. }) => {
                let hello: Hello = serde_json::from_value(d)?;
                if hello.code != 0 {
                    return Err(KookError::Gateway(format!("hello returned code {}", hello.code)));
                }
                info!(session_id = %hello.session_id, "KOOK gateway handshake complete");
            }
            Some(frame) => {
                return Err(KookError::Gateway(format!(
                    "expected hello, got signal {}",
                    frame.s
                )));
            }
            None => return Err(KookError::Gateway("expected hello, got a control frame".into())),
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_gateway(ws, events, cancel.clone()));
        Ok(GatewayLink::new(cancel, task))
    }

    async fn user_me(&self) -> Result<User, KookError> {
        self.get("user/me", &[]).await
    }

    async fn user_view(&self, user_id: &str, guild_id: &str) -> Result<User, KookError> {
        self.get("user/view", &[("user_id", user_id), ("guild_id", guild_id)])
            .await
    }

    async fn guild_view(&self, guild_id: &str) -> Result<Guild, KookError> {
        self.get("guild/view", &[("guild_id", guild_id)]).await
    }

    async fn guild_list(&self) -> Result<Vec<Guild>, KookError> {
        let mut guilds = Vec::new();
        let mut page_no: u32 = 1;
        loop {
            let page_str = page_no.to_string();
            let page: Page<Guild> = self
                .get(
                    "guild/list",
                    &[("page", page_str.as_str()), ("page_size", GUILD_PAGE_SIZE)],
                )
                .await?;
            let last = page.items.is_empty() || page.meta.page >= page.meta.page_total;
            guilds.extend(page.items);
            if last {
                break;
            }
            page_no += 1;
        }
        Ok(guilds)
    }

    async fn channel_view(&self, channel_id: &str) -> Result<Channel, KookError> {
        self.get("channel/view", &[("target_id", channel_id)]).await
    }

    async fn user_chat_create(&self, user_id: &str) -> Result<UserChat, KookError> {
        let envelope = self
            .post("user-chat/create", serde_json::json!({ "target_id": user_id }))
            .await?;
        require_data("user-chat/create", envelope)
    }

    async fn direct_message_create(&self, chat_code: &str, content: &str) -> Result<(), KookError> {
        let envelope: Envelope<MessageReceipt> = self
            .post(
                "direct-message/create",
                serde_json::json!({
                    "type": MESSAGE_TYPE_TEXT,
                    "chat_code": chat_code,
                    "content": content,
                }),
            )
            .await?;
        if let Some(receipt) = envelope.data {
            trace!(msg_id = %receipt.msg_id, "direct message delivered");
        }
        Ok(())
    }

    async fn message_create(&self, channel_id: &str, content: &str) -> Result<(), KookError> {
        let envelope: Envelope<MessageReceipt> = self
            .post(
                "message/create",
                serde_json::json!({
                    "type": MESSAGE_TYPE_TEXT,
                    "target_id": channel_id,
                    "content": content,
                }),
            )
            .await?;
        if let Some(receipt) = envelope.data {
            trace!(msg_id = %receipt.msg_id, "channel message delivered");
        }
        Ok(())
    }

    async fn guild_leave(&self, guild_id: &str) -> Result<(), KookError> {
        self.post::<serde_json::Value>("guild/leave", serde_json::json!({ "guild_id": guild_id }))
            .await
            .map(|_| ())
    }

    async fn guild_nickname(&self, guild_id: &str, user_id: &str, nickname: &str) -> Result<(), KookError> {
        self.post::<serde_json::Value>(
            "guild/nickname",
            serde_json::json!({
                "guild_id": guild_id,
                "user_id": user_id,
                "nickname": nickname,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn game_activity(&self, game_id: i64) -> Result<(), KookError> {
        self.post::<serde_json::Value>(
            "game/activity",
            serde_json::json!({ "id": game_id, "data_type": 1 }),
        )
        .await
        .map(|_| ())
    }
}

/// Decodes a websocket message into a gateway frame.
///
/// Control messages (ping, pong, close) carry no frame and yield `None`.
fn parse_frame(message: WsMessage) -> Result<Option<Frame>, KookError> {
    match message {
        WsMessage::Text(text) => Ok(Some(serde_json::from_str(text.as_str())?)),
        WsMessage::Binary(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => {
            Ok(None)
        }
    }
}

/// Reads gateway frames until cancelled, the server asks for a reconnect, or
/// the socket fails. Keeps the connection alive with periodic pings.
async fn run_gateway<S>(ws: S, events: mpsc::Sender<KookEvent>, cancel: CancellationToken)
where
    S: Stream<Item = Result<WsMessage, WsError>> + Sink<WsMessage, Error = WsError> + Send + Unpin,
{
    let (mut sink, mut source) = ws.split();
    let mut last_sn: u64 = 0;
    let mut ping = tokio::time::interval_at(tokio::time::Instant::now() + PING_INTERVAL, PING_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("gateway reader cancelled");
                let _ = sink.send(WsMessage::Close(None)).await;
                break;
            }
            _ = ping.tick() => {
                let payload = serde_json::json!({ "s": SIGNAL_PING, "sn": last_sn }).to_string();
                if let Err(e) = sink.send(WsMessage::Text(payload.into())).await {
                    warn!(error = %e, "failed to send gateway ping");
                    break;
                }
            }
            next = source.next() => {
                let message = match next {
                    None => {
                        warn!("gateway stream ended");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "gateway read failed");
                        break;
                    }
                    Some(Ok(message)) => message,
                };
                let frame = match parse_frame(message) {
                    Ok(Some(frame)) => frame,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(error = %e, "dropping undecodable gateway frame");
                        continue;
                    }
                };
                match frame.s {
                    SIGNAL_EVENT => {
                        if let Some(sn) = frame.sn {
                            last_sn = sn;
                        }
                        match serde_json::from_value::<KookEvent>(frame.d) {
                            Ok(event) => {
                                if events.send(event).await.is_err() {
                                    debug!("event receiver dropped, stopping gateway reader");
                                    break;
                                }
                            }
                            Err(e) => debug!(sn = last_sn, error = %e, "dropping unrecognized event"),
                        }
                    }
                    SIGNAL_PONG => trace!("gateway pong"),
                    SIGNAL_RECONNECT => {
                        warn!("gateway requested a reconnect");
                        break;
                    }
                    SIGNAL_RESUME_ACK => debug!("gateway resume acknowledged"),
                    other => debug!(signal = other, "ignoring gateway signal"),
                }
            }
        }
    }
}
