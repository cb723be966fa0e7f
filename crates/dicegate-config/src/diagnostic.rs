// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Miette diagnostics for configuration problems.
//!
//! Every error names where it happened the way a user would point at it in
//! `dicegate.toml`: `daemon.log_level`, `sessions[1].name`,
//! `sessions[0].endpoints[2]`. When the offending file is known, unknown keys
//! are underlined inside the right `[[sessions]]` / `[[sessions.endpoints]]`
//! block even when many blocks share the same header.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score above which a known key is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML file that took part in loading, kept so diagnostics can quote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: String,
    pub text: String,
}

/// A configuration problem, located by its dotted/indexed path.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("{location}: unknown key `{key}`")]
    #[diagnostic(
        code(dicegate::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), allowed))
    )]
    UnknownKey {
        location: String,
        key: String,
        suggestion: Option<String>,
        /// Keys accepted at `location`, comma separated.
        allowed: String,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// An endpoint names a platform no adapter exists for.
    #[error("{location}: unsupported platform `{platform}`")]
    #[diagnostic(
        code(dicegate::config::unsupported_platform),
        help("supported platforms: {supported}")
    )]
    UnsupportedPlatform {
        location: String,
        platform: String,
        supported: String,
    },

    /// An endpoint entry without its `platform` tag.
    #[error("{location}: endpoint has no `platform`")]
    #[diagnostic(
        code(dicegate::config::missing_platform),
        help("every [[sessions.endpoints]] entry starts with `platform = \"KOOK\"`")
    )]
    MissingPlatform { location: String },

    #[error("{location}: expected {expected}, found {found}")]
    #[diagnostic(code(dicegate::config::wrong_type))]
    WrongType {
        location: String,
        expected: String,
        found: String,
    },

    /// A value that parsed but makes no sense, found by `validate_config`.
    #[error("{location}: {reason}")]
    #[diagnostic(code(dicegate::config::invalid))]
    Invalid { location: String, reason: String },

    /// The file passed with `--config` could not be read.
    #[error("cannot read config file `{path}`: {reason}")]
    #[diagnostic(
        code(dicegate::config::unreadable),
        help("check the path given to --config")
    )]
    Unreadable { path: String, reason: String },

    /// TOML syntax errors and anything else figment reports verbatim.
    #[error("{0}")]
    #[diagnostic(code(dicegate::config::malformed))]
    Malformed(String),
}

impl ConfigError {
    pub fn invalid(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Where the problem is, when it has a location.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::UnknownKey { location, .. }
            | Self::UnsupportedPlatform { location, .. }
            | Self::MissingPlatform { location }
            | Self::WrongType { location, .. }
            | Self::Invalid { location, .. } => Some(location),
            Self::Unreadable { .. } | Self::Malformed(_) => None,
        }
    }
}

fn unknown_key_help(suggestion: Option<&str>, allowed: &str) -> String {
    match suggestion {
        Some(key) => format!("did you mean `{key}`? allowed here: {allowed}"),
        None => format!("allowed here: {allowed}"),
    }
}

/// Renders a figment key path as `sessions[0].endpoints[1].token`.
///
/// The empty path is the top level of the file.
pub fn display_location(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        if segment.parse::<usize>().is_ok() {
            out.push('[');
            out.push_str(segment);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        }
    }
    if out.is_empty() {
        out.push_str("top level");
    }
    out
}

/// Splits a figment extraction failure into one diagnostic per problem.
pub fn from_figment(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let location = display_location(&error.path);
            match &error.kind {
                Kind::UnknownField(key, allowed) => {
                    let (span, src) = match locate_key(&error, key, sources) {
                        Some((span, src)) => (Some(span), Some(src)),
                        None => (None, None),
                    };
                    ConfigError::UnknownKey {
                        location,
                        key: key.clone(),
                        suggestion: suggest_key(key, allowed),
                        allowed: allowed.join(", "),
                        span,
                        src,
                    }
                }
                Kind::UnknownVariant(platform, supported) => ConfigError::UnsupportedPlatform {
                    location,
                    platform: platform.clone(),
                    supported: supported.join(", "),
                },
                Kind::MissingField(field) if &**field == "platform" => {
                    ConfigError::MissingPlatform { location }
                }
                Kind::InvalidType(found, expected) | Kind::InvalidValue(found, expected) => {
                    ConfigError::WrongType {
                        location,
                        expected: expected.clone(),
                        found: found.to_string(),
                    }
                }
                _ => ConfigError::Malformed(error.to_string()),
            }
        })
        .collect()
}

/// Finds the file an unknown key came from and underlines it there.
fn locate_key(
    error: &figment::Error,
    key: &str,
    sources: &[ConfigSource],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let Some(figment::Source::File(file)) = error.metadata.as_ref()?.source.as_ref() else {
        return None;
    };
    let source = sources.iter().find(|s| Path::new(&s.path) == file.as_path())?;
    let offset = key_offset(&source.text, &error.path, key)?;
    Some((
        SourceSpan::new(offset.into(), key.len()),
        NamedSource::new(&source.path, source.text.clone()),
    ))
}

/// Byte offset of `key` inside the table that `path` names.
///
/// Array indices select among repeated headers, so
/// `["sessions", "1", "endpoints", "0"]` resolves to the first
/// `[[sessions.endpoints]]` block after the second `[[sessions]]` header.
pub fn key_offset(text: &str, path: &[String], key: &str) -> Option<usize> {
    let lines = line_starts(text);
    let mut body = 0..lines.len();
    let mut table: Vec<&str> = Vec::new();

    let mut segments = path.iter().peekable();
    while let Some(name) = segments.next() {
        table.push(name);
        let prefix = table.join(".");
        let (header, nth) = match segments.peek().and_then(|s| s.parse::<usize>().ok()) {
            Some(index) => {
                segments.next();
                (format!("[[{prefix}]]"), index)
            }
            None => (format!("[{prefix}]"), 0),
        };

        let start = body
            .clone()
            .filter(|&i| lines[i].1.trim() == header)
            .nth(nth)?
            + 1;
        let end = (start..body.end)
            .find(|&i| is_header(lines[i].1) && !header_is_under(lines[i].1, &prefix))
            .unwrap_or(body.end);
        body = start..end;
    }

    // Keys of the table itself come before its first sub-table header.
    body.take_while(|&i| !is_header(lines[i].1)).find_map(|i| {
        let (start, line) = lines[i];
        let trimmed = line.trim_start();
        let rest = trimmed.strip_prefix(key)?;
        rest.trim_start()
            .starts_with('=')
            .then(|| start + (line.len() - trimmed.len()))
    })
}

fn line_starts(text: &str) -> Vec<(usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n')
        .map(|raw| {
            let start = offset;
            offset += raw.len();
            (start, raw.trim_end_matches(['\n', '\r']))
        })
        .collect()
}

fn is_header(line: &str) -> bool {
    line.trim_start().starts_with('[')
}

/// True for `[prefix.x]` and `[[prefix.x]]`, the sub-tables of `prefix`.
fn header_is_under(line: &str, prefix: &str) -> bool {
    let name = line.trim().trim_start_matches('[').trim_end_matches(']').trim();
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Closest allowed key to `unknown`, if any is close enough to be a typo.
pub fn suggest_key(unknown: &str, allowed: &[&str]) -> Option<String> {
    allowed
        .iter()
        .map(|&key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Writes each diagnostic to stderr with miette's graphical renderer.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
