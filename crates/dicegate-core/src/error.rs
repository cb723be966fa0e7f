// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dicegate platform gateway.

use thiserror::Error;

/// The primary error type used across adapter traits and core operations.
///
/// Adapter-level failures are terminal at the adapter boundary: they are
/// logged, reflected in endpoint state, or returned from `serve()`, and never
/// forwarded into the dispatch pipeline.
#[derive(Debug, Error)]
pub enum DicegateError {
    /// Configuration errors (invalid TOML, missing token, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Platform transport errors (connect, send, or lookup against the native API).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A user, group, guild, or endpoint could not be found.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// An endpoint lifecycle operation was rejected.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Persistence collaborator errors (snapshot write, close).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DicegateError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Maps the error to the numeric status code reported by `serve()`.
    ///
    /// Every failure is non-zero; `0` is reserved for success.
    pub fn status_code(&self) -> i32 {
        match self {
            DicegateError::Config(_) => 2,
            _ => 1,
        }
    }
}
