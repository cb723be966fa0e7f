// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment layering for `dicegate.toml`.
//!
//! Compiled defaults come first, then each file from [`search_paths`] in
//! order, then `DICEGATE_DAEMON_*` environment variables. Sessions and their
//! endpoints are arrays of tables and can only come from files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::diagnostic::ConfigSource;
use crate::model::DicegateConfig;

const FILE_NAME: &str = "dicegate.toml";
const SYSTEM_DIR: &str = "/etc/dicegate";
const ENV_PREFIX: &str = "DICEGATE_";

/// Config files merged by [`load_config`], lowest precedence first:
/// `/etc/dicegate/`, the user config dir, then the working directory.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![Path::new(SYSTEM_DIR).join(FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("dicegate").join(FILE_NAME));
    }
    paths.push(PathBuf::from(FILE_NAME));
    paths
}

fn defaults() -> Figment {
    Figment::from(Serialized::defaults(DicegateConfig::default()))
}

/// Only `daemon.*` scalars can be overridden; `DICEGATE_DAEMON_DATA_DIR`
/// sets `daemon.data_dir`. Other `DICEGATE_*` variables are ignored.
fn daemon_env() -> Env {
    Env::prefixed(ENV_PREFIX)
        .filter(|key| key.as_str().to_ascii_lowercase().starts_with("daemon_"))
        .map(|key| {
            let field = key.as_str().to_ascii_lowercase().split_off("daemon_".len());
            format!("daemon.{field}").into()
        })
}

/// The full layered figment used by `dicegate serve` without `--config`.
pub fn layered_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)))
        .merge(daemon_env())
}

pub fn load_config() -> Result<DicegateConfig, figment::Error> {
    layered_figment().extract()
}

/// Loads one explicit file instead of the search paths. Env overrides still apply.
pub fn load_config_from_path(path: &Path) -> Result<DicegateConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(daemon_env())
        .extract()
}

/// Loads TOML text over the defaults, without files or env.
pub fn load_config_from_str(toml_content: &str) -> Result<DicegateConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

/// Reads whichever of `paths` exist, keyed by the absolute path figment reports.
pub fn read_sources(paths: &[PathBuf]) -> Vec<ConfigSource> {
    paths
        .iter()
        .filter_map(|path| {
            let text = std::fs::read_to_string(path).ok()?;
            let path = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            Some(ConfigSource {
                path: path.display().to_string(),
                text,
            })
        })
        .collect()
}
