//! Screen lock held while a blocking intent is in flight.
//!
//! Each lock category admits one holder at a time. The token is released when
//! its [`LockGuard`] drops, so a failed or aborted intent cannot leave the
//! screen locked.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::{error::OrchestratorError, ClientEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockCategory {
    DefectTypes,
    PatternAnalysis,
    Notifications,
}

impl LockCategory {
    pub fn name(self) -> &'static str {
        match self {
            Self::DefectTypes => "defect types",
            Self::PatternAnalysis => "pattern analysis",
            Self::Notifications => "notifications",
        }
    }
}

#[derive(Clone)]
pub struct ScreenLock {
    inner: Arc<LockInner>,
}

struct LockInner {
    held: Mutex<HashSet<LockCategory>>,
    engaged: watch::Sender<bool>,
    events: Option<broadcast::Sender<ClientEvent>>,
}

impl Default for ScreenLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenLock {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Also announces every engage and release as [`ClientEvent::LockChanged`].
    pub fn with_events(events: broadcast::Sender<ClientEvent>) -> Self {
        Self::build(Some(events))
    }

    fn build(events: Option<broadcast::Sender<ClientEvent>>) -> Self {
        let (engaged, _) = watch::channel(false);
        Self {
            inner: Arc::new(LockInner {
                held: Mutex::new(HashSet::new()),
                engaged,
                events,
            }),
        }
    }

    pub fn engage(&self, category: LockCategory) -> Result<LockGuard, OrchestratorError> {
        let mut held = self.held();
        if !held.insert(category) {
            return Err(OrchestratorError::Busy(category));
        }
        self.inner.engaged.send_replace(true);
        self.announce(category, true);
        debug!(category = category.name(), "screen lock: engaged");
        Ok(LockGuard {
            lock: self.clone(),
            category,
        })
    }

    pub fn is_engaged(&self) -> bool {
        !self.held().is_empty()
    }

    pub fn is_held(&self, category: LockCategory) -> bool {
        self.held().contains(&category)
    }

    /// Receiver that flips whenever the screen goes from unlocked to locked or back.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.engaged.subscribe()
    }

    fn release(&self, category: LockCategory) {
        let mut held = self.held();
        held.remove(&category);
        self.inner.engaged.send_replace(!held.is_empty());
        self.announce(category, false);
        debug!(category = category.name(), "screen lock: released");
    }

    // Sent while `held` is locked so subscribers see transitions in order.
    fn announce(&self, category: LockCategory, engaged: bool) {
        if let Some(events) = &self.inner.events {
            let _ = events.send(ClientEvent::LockChanged { category, engaged });
        }
    }

    fn held(&self) -> MutexGuard<'_, HashSet<LockCategory>> {
        self.inner.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    lock: ScreenLock,
    category: LockCategory,
}

impl LockGuard {
    pub fn category(&self) -> LockCategory {
        self.category
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.lock.release(self.category);
    }
}
