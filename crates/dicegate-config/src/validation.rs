// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that run after the config deserialized cleanly.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::diagnostic::ConfigError;
use crate::model::{DicegateConfig, EndpointConfig, KookEndpointConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Reports every problem at once rather than stopping at the first.
pub fn validate_config(config: &DicegateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.daemon.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::invalid(
            "daemon.log_level",
            format!(
                "`{}` is not one of {}",
                config.daemon.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if config.daemon.data_dir.trim().is_empty() {
        errors.push(ConfigError::invalid("daemon.data_dir", "must not be empty"));
    }

    let mut first_use: HashMap<&str, usize> = HashMap::new();
    for (i, session) in config.sessions.iter().enumerate() {
        let location = format!("sessions[{i}].name");
        match session_name_problem(&session.name) {
            Some(reason) => errors.push(ConfigError::invalid(location, reason)),
            None => match first_use.entry(session.name.as_str()) {
                Entry::Occupied(first) => errors.push(ConfigError::invalid(
                    location,
                    format!("`{}` is already used by sessions[{}]", session.name, first.get()),
                )),
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
            },
        }

        for (j, endpoint) in session.endpoints.iter().enumerate() {
            let location = format!("sessions[{i}].endpoints[{j}]");
            match endpoint {
                EndpointConfig::Kook(kook) => check_kook(&location, kook, &mut errors),
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Session names become snapshot file names under `daemon.data_dir`.
fn session_name_problem(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("must not be empty")
    } else if name.contains(['/', '\\']) {
        Some("must not contain a path separator")
    } else if name.contains("..") {
        Some("must not contain `..`")
    } else {
        None
    }
}

fn check_kook(location: &str, kook: &KookEndpointConfig, errors: &mut Vec<ConfigError>) {
    if kook.enabled && kook.token.trim().is_empty() {
        errors.push(ConfigError::invalid(
            format!("{location}.token"),
            "an enabled KOOK endpoint needs a bot token",
        ));
    }
    if !kook.api_base.starts_with("http://") && !kook.api_base.starts_with("https://") {
        errors.push(ConfigError::invalid(
            format!("{location}.api_base"),
            format!("`{}` is not an http(s) URL", kook.api_base),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SessionConfig;

    fn kook(token: &str, enabled: bool) -> EndpointConfig {
        EndpointConfig::Kook(KookEndpointConfig {
            token: token.to_string(),
            enabled,
            api_base: "https://www.kookapp.cn/api/v3".to_string(),
        })
    }

    fn session(name: &str) -> SessionConfig {
        SessionConfig {
            name: name.to_string(),
            endpoints: vec![],
        }
    }

    fn locations(errors: &[ConfigError]) -> Vec<&str> {
        errors.iter().filter_map(ConfigError::location).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&DicegateConfig::default()).is_ok());
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = DicegateConfig::default();
        config.daemon.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(locations(&errors), vec!["daemon.log_level"]);
    }

    #[test]
    fn empty_data_dir_fails_validation() {
        let mut config = DicegateConfig::default();
        config.daemon.data_dir = " ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(locations(&errors), vec!["daemon.data_dir"]);
    }

    #[test]
    fn duplicate_session_name_points_at_first_use() {
        let mut config = DicegateConfig::default();
        config.sessions.push(session("other"));
        config.sessions.push(session("default"));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].location(), Some("sessions[2].name"));
        assert!(errors[0].to_string().contains("already used by sessions[0]"));
    }

    #[test]
    fn session_names_cannot_escape_the_data_dir() {
        for name in ["../etc/passwd", "a/b", "a\\b", "..", "x..y"] {
            let mut config = DicegateConfig::default();
            config.sessions[0].name = name.to_string();
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(locations(&errors), vec!["sessions[0].name"], "name {name:?}");
        }
        let mut config = DicegateConfig::default();
        config.sessions[0].name = "table-1.campaign".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn enabled_endpoint_requires_token() {
        let mut config = DicegateConfig::default();
        config.sessions[0].endpoints.push(kook("x", true));
        config.sessions[0].endpoints.push(kook("", true));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(locations(&errors), vec!["sessions[0].endpoints[1].token"]);
    }

    #[test]
    fn disabled_endpoint_may_omit_token() {
        let mut config = DicegateConfig::default();
        config.sessions[0].endpoints.push(kook("", false));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn api_base_must_be_http() {
        let mut config = DicegateConfig::default();
        config.sessions[0].endpoints.push(EndpointConfig::Kook(KookEndpointConfig {
            token: "t".to_string(),
            enabled: true,
            api_base: "ftp://kook".to_string(),
        }));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(locations(&errors), vec!["sessions[0].endpoints[0].api_base"]);
    }

    #[test]
    fn collects_all_errors() {
        let mut config = DicegateConfig::default();
        config.daemon.log_level = "loud".to_string();
        config.sessions[0].endpoints.push(kook("", true));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
