// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock session store.

use std::sync::{Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dicegate_core::{DicegateError, SessionSnapshot, SessionStore};

use crate::{CallLog, push};

/// Records saved snapshots and close calls.
///
/// Can be scripted to hang forever on `save` (to exercise the shutdown
/// watchdog only on the first attempt), to fail, or to panic.
pub struct MockStore {
    name: String,
    saved: Mutex<Vec<SessionSnapshot>>,
    closes: AtomicUsize,
    save_attempts: AtomicUsize,
    hang_first_save: AtomicBool,
    hang_always: AtomicBool,
    fail: AtomicBool,
    panic_on_save: AtomicBool,
    log: Option<CallLog>,
}

impl MockStore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            saved: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            save_attempts: AtomicUsize::new(0),
            hang_first_save: AtomicBool::new(false),
            hang_always: AtomicBool::new(false),
            fail: AtomicBool::new(false),
            panic_on_save: AtomicBool::new(false),
            log: None,
        }
    }

    /// Records `save <name>` / `close <name>` entries into `log`.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn hanging_first_save(self) -> Self {
        self.hang_first_save.store(true, Ordering::SeqCst);
        self
    }

    pub fn hanging(self) -> Self {
        self.hang_always.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn panicking(self) -> Self {
        self.panic_on_save.store(true, Ordering::SeqCst);
        self
    }

    pub fn saved(&self) -> Vec<SessionSnapshot> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for MockStore {
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), DicegateError> {
        let attempt = self.save_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            push(log, format!("save {}", self.name));
        }
        if self.hang_always.load(Ordering::SeqCst)
            || (attempt == 0 && self.hang_first_save.load(Ordering::SeqCst))
        {
            std::future::pending::<()>().await;
        }
        if self.panic_on_save.load(Ordering::SeqCst) {
            panic!("mock store {} panicked while saving", self.name);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DicegateError::Storage {
                source: Box::new(std::io::Error::other("disk full")),
            });
        }
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).push(snapshot.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), DicegateError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.log {
            push(log, format!("close {}", self.name));
        }
        Ok(())
    }
}
