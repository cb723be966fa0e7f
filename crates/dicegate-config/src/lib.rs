// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Dicegate gateway: sessions, their platform
//! endpoints, and daemon settings.
//!
//! Loading is strict. Unknown keys, unsupported platforms and bad values all
//! come back together as located [`ConfigError`]s that `render_errors` prints
//! with miette.
//!
//! ```no_run
//! let config = match dicegate_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         dicegate_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("{} session(s)", config.sessions.len());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, ConfigSource, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{DaemonConfig, DicegateConfig, EndpointConfig, KookEndpointConfig, SessionConfig};

/// Loads from the search paths and env, then validates.
pub fn load_and_validate() -> Result<DicegateConfig, Vec<ConfigError>> {
    checked(loader::load_config(), || {
        loader::read_sources(&loader::search_paths())
    })
}

/// Loads the file given with `--config`, then validates.
pub fn load_and_validate_path(path: &Path) -> Result<DicegateConfig, Vec<ConfigError>> {
    if let Err(e) = std::fs::metadata(path) {
        return Err(vec![ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        }]);
    }
    checked(loader::load_config_from_path(path), || {
        loader::read_sources(&[path.to_path_buf()])
    })
}

pub fn load_and_validate_str(toml_content: &str) -> Result<DicegateConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), Vec::new)
}

/// Sources are only read back when there is an error to point into.
fn checked(
    loaded: Result<DicegateConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<ConfigSource>,
) -> Result<DicegateConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::from_figment(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}
