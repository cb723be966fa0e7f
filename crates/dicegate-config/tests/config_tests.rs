// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Dicegate configuration system.

use std::io::Write;

use dicegate_config::diagnostic::{ConfigError, suggest_key};
use dicegate_config::model::{DicegateConfig, EndpointConfig};
use dicegate_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// A full configuration with two sessions deserializes successfully.
#[test]
fn valid_toml_deserializes_into_dicegate_config() {
    let toml = r#"
[daemon]
log_level = "debug"
data_dir = "/var/lib/dicegate"

[[sessions]]
name = "main"

[[sessions.endpoints]]
platform = "KOOK"
token = "1/MTA=/abc"

[[sessions.endpoints]]
platform = "KOOK"
token = "2/MjA=/def"
enabled = false

[[sessions]]
name = "staging"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.daemon.log_level, "debug");
    assert_eq!(config.daemon.data_dir, "/var/lib/dicegate");
    assert_eq!(config.sessions.len(), 2);
    assert_eq!(config.sessions[0].name, "main");
    assert_eq!(config.sessions[0].endpoints.len(), 2);

    let EndpointConfig::Kook(first) = &config.sessions[0].endpoints[0];
    assert_eq!(first.token, "1/MTA=/abc");
    assert!(first.enabled, "enabled defaults to true");
    assert_eq!(first.api_base, "https://www.kookapp.cn/api/v3");
    assert!(!config.sessions[0].endpoints[1].enabled());
    assert!(config.sessions[1].endpoints.is_empty());
}

/// An empty file yields the compiled defaults: one empty session named "default".
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.daemon.log_level, "info");
    assert_eq!(config.daemon.data_dir, "./data");
    assert_eq!(config.sessions.len(), 1);
    assert_eq!(config.sessions[0].name, "default");
    assert!(config.sessions[0].endpoints.is_empty());
}

/// Declaring sessions in TOML replaces the default session rather than appending to it.
#[test]
fn declared_sessions_replace_default_session() {
    let toml = r#"
[[sessions]]
name = "only"
"#;
    let config = load_config_from_str(toml).unwrap();
    assert_eq!(config.sessions.len(), 1);
    assert_eq!(config.sessions[0].name, "only");
}

/// A dotted override (what `DICEGATE_DAEMON_LOG_LEVEL` maps to) beats the TOML value.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let toml_content = r#"
[daemon]
log_level = "warn"
"#;

    let config: DicegateConfig = Figment::new()
        .merge(Serialized::defaults(DicegateConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("daemon.log_level", "trace"))
        .extract()
        .expect("should merge env override");

    assert_eq!(config.daemon.log_level, "trace");
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: DicegateConfig = Figment::new()
        .merge(Serialized::defaults(DicegateConfig::default()))
        .merge(Toml::file("/nonexistent/path/dicegate.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.sessions[0].name, "default");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unsupported platform tags are reported against their endpoint.
#[test]
fn unknown_platform_is_rejected() {
    let toml = r#"
[[sessions]]
name = "main"

[[sessions.endpoints]]
platform = "KOOK"
token = "abc"

[[sessions.endpoints]]
platform = "Discord"
token = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown platform should fail");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnsupportedPlatform { location, platform, supported } if {
            location.starts_with("sessions[0].endpoints[1]")
                && platform == "Discord"
                && supported == "KOOK"
        })
    });
    assert!(found, "got: {errors:?}");
}

#[test]
fn endpoint_without_platform_is_reported() {
    let toml = r#"
[[sessions]]
name = "main"

[[sessions.endpoints]]
token = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("missing platform should fail");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::MissingPlatform { .. })),
        "got: {errors:?}"
    );
}

/// Misspelled endpoint key names its endpoint and gets a suggestion.
#[test]
fn misspelled_endpoint_key_suggests_token() {
    let toml = r#"
[[sessions]]
name = "main"

[[sessions]]
name = "alt"

[[sessions.endpoints]]
platform = "KOOK"
token = "abc"

[[sessions.endpoints]]
platform = "KOOK"
tokn = "abc"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { location, key, suggestion, .. } if {
            location == "sessions[1].endpoints[1]"
                && key == "tokn"
                && suggestion.as_deref() == Some("token")
        })
    });
    assert!(has_unknown_key, "expected suggestion for `tokn`, got: {errors:?}");
    assert!(
        errors
            .iter()
            .any(|e| e.to_string() == "sessions[1].endpoints[1]: unknown key `tokn`")
    );
}

/// Unknown keys in an explicit file are underlined in the right endpoint block.
#[test]
fn unknown_key_in_file_points_into_its_block() {
    let text = r#"[[sessions]]
name = "main"

[[sessions.endpoints]]
platform = "KOOK"
token = "a"

[[sessions.endpoints]]
platform = "KOOK"
enabld = false
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();

    let errors = load_and_validate_path(file.path()).expect_err("typo should fail");
    let span = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey { key, span, .. } if key == "enabld" => *span,
            _ => None,
        })
        .expect("span for `enabld`");
    assert_eq!(&text[span.offset()..span.offset() + span.len()], "enabld");
}

/// Unknown key in [daemon] lists the valid keys and suggests the closest one.
#[test]
fn diagnostic_error_includes_valid_keys_and_suggestion() {
    let toml = r#"
[daemon]
log_levl = "info"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { location, key, suggestion, allowed, .. } if {
            location == "daemon"
                && key == "log_levl"
                && suggestion.as_deref() == Some("log_level")
                && allowed.contains("log_level")
                && allowed.contains("data_dir")
        })
    });
    assert!(found, "got: {errors:?}");
}

#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    assert!(suggest_key("zzzzzz", &["log_level", "data_dir"]).is_none());
}

/// Invalid type (string where bool expected) is reported as a wrong type.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[daemon]
log_level = ["info"]
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| {
            matches!(e, ConfigError::WrongType { location, .. } if location == "daemon.log_level")
        }),
        "got: {errors:?}"
    );
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        location: "sessions[0].endpoints[0]".to_string(),
        key: "tokn".to_string(),
        suggestion: Some("token".to_string()),
        allowed: "token, enabled, api_base".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `token`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("tokn"));
    assert!(buf.contains("sessions[0].endpoints[0]"));
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_empty_token_for_enabled_endpoint() {
    let toml = r#"
[[sessions]]
name = "main"

[[sessions.endpoints]]
platform = "KOOK"
"#;

    let errors = load_and_validate_str(toml).expect_err("empty token should fail");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location(), Some("sessions[0].endpoints[0].token"));
}

#[test]
fn validation_catches_duplicate_session_names() {
    let toml = r#"
[[sessions]]
name = "main"

[[sessions]]
name = "main"
"#;

    let errors = load_and_validate_str(toml).expect_err("duplicates should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Invalid { location, reason } if {
            location == "sessions[1].name" && reason.contains("already used")
        })
    }));
}

#[test]
fn validation_rejects_session_name_with_path() {
    let toml = r#"
[[sessions]]
name = "../../escape"
"#;

    let errors = load_and_validate_str(toml).expect_err("path-like name should fail");
    assert_eq!(errors[0].location(), Some("sessions[0].name"));
}

/// An explicit config file is loaded and validated.
#[test]
fn load_and_validate_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[daemon]
data_dir = "/tmp/dicegate-test"

[[sessions]]
name = "from-file"
"#
    )
    .unwrap();

    let config = load_and_validate_path(file.path()).expect("file config should validate");
    assert_eq!(config.daemon.data_dir, "/tmp/dicegate-test");
    assert_eq!(config.sessions[0].name, "from-file");
}

#[test]
fn load_and_validate_missing_explicit_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let errors = load_and_validate_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Unreadable { path, .. } if path.ends_with("absent.toml")));
}

#[test]
fn load_and_validate_str_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.sessions[0].name, "default");
}
