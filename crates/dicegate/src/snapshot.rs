// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON snapshot store for sessions.
//!
//! Each session is written to `<data_dir>/<session>.json`. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a reader never sees a half-written snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dicegate_core::{DicegateError, SessionSnapshot, SessionStore};
use tracing::debug;

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl AsRef<Path>, session: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{session}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the last saved snapshot, if any.
    pub fn load(&self) -> Result<Option<SessionSnapshot>, DicegateError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };
        serde_json::from_slice(&bytes).map(Some).map_err(storage)
    }
}

#[async_trait]
impl SessionStore for SnapshotStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), DicegateError> {
        let path = self.path.clone();
        let json = serde_json::to_vec_pretty(snapshot).map_err(storage)?;
        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| DicegateError::Internal(format!("snapshot writer failed: {e}")))??;
        debug!(path = %self.path.display(), "session snapshot saved");
        Ok(())
    }

    async fn close(&self) -> Result<(), DicegateError> {
        debug!(path = %self.path.display(), "snapshot store closed");
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), DicegateError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(storage)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(storage)?;
    tmp.write_all(contents).map_err(storage)?;
    tmp.as_file().sync_all().map_err(storage)?;
    tmp.persist(path).map_err(|e| storage(e.error))?;
    Ok(())
}

fn storage(e: impl std::error::Error + Send + Sync + 'static) -> DicegateError {
    DicegateError::Storage {
        source: Box::new(e),
    }
}
