// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Dicegate gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Dicegate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DicegateConfig {
    /// Process-level settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Sessions, each owning a roster of platform endpoints.
    #[serde(default = "default_sessions")]
    pub sessions: Vec<SessionConfig>,
}

impl Default for DicegateConfig {
    fn default() -> Self {
        Self {
            daemon: DaemonConfig::default(),
            sessions: default_sessions(),
        }
    }
}

fn default_sessions() -> Vec<SessionConfig> {
    vec![SessionConfig {
        name: default_session_name(),
        endpoints: Vec::new(),
    }]
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding session snapshots.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> String {
    "./data".to_string()
}

/// One session: a named roster of endpoints sharing hooks and group caches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default = "default_session_name")]
    pub name: String,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

fn default_session_name() -> String {
    "default".to_string()
}

/// A configured platform account, tagged by platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "platform")]
pub enum EndpointConfig {
    #[serde(rename = "KOOK")]
    Kook(KookEndpointConfig),
}

impl EndpointConfig {
    pub fn enabled(&self) -> bool {
        match self {
            EndpointConfig::Kook(kook) => kook.enabled,
        }
    }

    pub fn platform_tag(&self) -> &'static str {
        match self {
            EndpointConfig::Kook(_) => "KOOK",
        }
    }
}

/// KOOK bot account settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KookEndpointConfig {
    /// Bot token from the KOOK developer console.
    #[serde(default)]
    pub token: String,

    /// Whether the orchestrator should start this endpoint.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// REST API base URL.
    #[serde(default = "default_kook_api_base")]
    pub api_base: String,
}

fn default_true() -> bool {
    true
}

fn default_kook_api_base() -> String {
    "https://www.kookapp.cn/api/v3".to_string()
}
