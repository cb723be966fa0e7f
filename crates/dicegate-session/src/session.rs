// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A session: one roster of endpoints sharing hooks, caches, and a store.
//!
//! The roster is an arena keyed by [`EndpointId`]. Adapters never point back
//! at their session; they receive a [`SessionContext`] when they are built.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use dicegate_core::{
    DicegateError, EndpointCell, EndpointId, EndpointStatus, Platform, PlatformAdapter,
    SessionContext, SessionSnapshot, SessionStore,
};
use tracing::{debug, info, warn};

#[derive(Default)]
struct Roster {
    next_id: u32,
    endpoints: BTreeMap<EndpointId, Arc<dyn PlatformAdapter>>,
}

pub struct Session {
    ctx: SessionContext,
    store: Arc<dyn SessionStore>,
    roster: RwLock<Roster>,
}

impl Session {
    pub fn new(ctx: SessionContext, store: Arc<dyn SessionStore>) -> Self {
        Self {
            ctx,
            store,
            roster: RwLock::new(Roster::default()),
        }
    }

    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Allocates an endpoint id and builds its adapter.
    ///
    /// `build` receives the endpoint's lifecycle cell and a clone of the
    /// session context. The adapter must report the same cell from
    /// [`PlatformAdapter::endpoint`]. Nothing is added if `build` fails.
    pub fn add_endpoint<F>(
        &self,
        platform: Platform,
        enabled: bool,
        build: F,
    ) -> Result<EndpointId, DicegateError>
    where
        F: FnOnce(EndpointCell, SessionContext) -> Result<Arc<dyn PlatformAdapter>, DicegateError>,
    {
        let mut roster = self.write();
        let id = EndpointId(roster.next_id);
        let adapter = build(EndpointCell::new(id, platform, enabled), self.ctx.clone())?;
        if adapter.endpoint().id() != id {
            return Err(DicegateError::Internal(format!(
                "adapter for {id} reports endpoint {}",
                adapter.endpoint().id()
            )));
        }
        roster.next_id += 1;
        roster.endpoints.insert(id, adapter);
        debug!(session = self.name(), endpoint = %id, platform = %platform, "endpoint added");
        Ok(id)
    }

    /// Removes an endpoint from the roster and closes its connection.
    pub async fn remove_endpoint(&self, id: EndpointId) -> Result<(), DicegateError> {
        let adapter = self
            .write()
            .endpoints
            .remove(&id)
            .ok_or_else(|| not_found(id))?;
        adapter.shutdown().await;
        info!(session = self.name(), endpoint = %id, "endpoint removed");
        Ok(())
    }

    pub fn adapter(&self, id: EndpointId) -> Option<Arc<dyn PlatformAdapter>> {
        self.read().endpoints.get(&id).cloned()
    }

    /// Adapters in endpoint id order.
    pub fn adapters(&self) -> Vec<Arc<dyn PlatformAdapter>> {
        self.read().endpoints.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().endpoints.is_empty()
    }

    pub fn endpoint_statuses(&self) -> Vec<EndpointStatus> {
        self.read()
            .endpoints
            .values()
            .map(|adapter| adapter.endpoint().status())
            .collect()
    }

    pub async fn set_enabled(&self, id: EndpointId, enable: bool) -> Result<(), DicegateError> {
        let adapter = self.adapter(id).ok_or_else(|| not_found(id))?;
        adapter.set_enabled(enable).await;
        Ok(())
    }

    pub async fn reconnect(&self, id: EndpointId) -> Result<bool, DicegateError> {
        let adapter = self.adapter(id).ok_or_else(|| not_found(id))?;
        Ok(adapter.reconnect().await)
    }

    pub fn snapshot(&self, now_unix: i64) -> SessionSnapshot {
        SessionSnapshot {
            name: self.name().to_string(),
            saved_at: now_unix,
            endpoints: self.endpoint_statuses(),
            group_names: self.ctx.group_names().snapshot(),
        }
    }

    pub async fn save(&self) -> Result<(), DicegateError> {
        let snapshot = self.snapshot(chrono::Utc::now().timestamp());
        self.store.save(&snapshot).await
    }

    pub async fn close_store(&self) -> Result<(), DicegateError> {
        self.store.close().await
    }

    /// Closes every connection in the roster; endpoints keep their enable intent.
    pub async fn shutdown_endpoints(&self) {
        for adapter in self.adapters() {
            adapter.shutdown().await;
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Roster> {
        self.roster.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Roster> {
        self.roster.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name())
            .field("endpoints", &self.len())
            .finish()
    }
}

fn not_found(id: EndpointId) -> DicegateError {
    let err = DicegateError::NotFound {
        kind: "endpoint",
        id: id.to_string(),
    };
    warn!(endpoint = %id, "unknown endpoint");
    err
}
