// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors raised by the KOOK transport.

use std::time::Duration;

use dicegate_core::DicegateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KookError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP request to `{endpoint}` failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The REST API answered with a non-zero envelope code.
    #[error("KOOK API `{endpoint}` returned code {code}: {message}")]
    Api {
        endpoint: String,
        code: i64,
        message: String,
    },

    #[error("failed to decode KOOK payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("gateway handshake failed: {0}")]
    Gateway(String),

    #[error("gateway did not say hello within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("invalid KOOK configuration: {0}")]
    Config(String),
}

impl From<KookError> for DicegateError {
    fn from(err: KookError) -> Self {
        match err {
            KookError::Config(message) => DicegateError::Config(message),
            KookError::HandshakeTimeout(duration) => DicegateError::Timeout { duration },
            other => DicegateError::Transport {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_to_transport() {
        let err: DicegateError = KookError::Api {
            endpoint: "user/me".into(),
            code: 401,
            message: "unauthorized".into(),
        }
        .into();
        assert!(matches!(err, DicegateError::Transport { .. }));
        assert!(err.to_string().contains("code 401"));
    }

    #[test]
    fn config_and_timeout_keep_their_kind() {
        let err: DicegateError = KookError::Config("empty token".into()).into();
        assert!(matches!(err, DicegateError::Config(_)));
        assert_eq!(err.status_code(), 2);

        let err: DicegateError = KookError::HandshakeTimeout(Duration::from_secs(6)).into();
        assert!(matches!(err, DicegateError::Timeout { .. }));
    }
}
