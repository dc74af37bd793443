// session-coordinator/src/cache.rs
use chrono::{DateTime, Utc};
use common::UserProfile;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Default freshness window in seconds
pub const DEFAULT_FRESHNESS_WINDOW: u64 = 30;

/// The last successful verification
#[derive(Debug, Clone)]
pub struct SessionCacheEntry {
    pub credential: String,
    pub user: UserProfile,
    pub verified_at: DateTime<Utc>,
}

impl SessionCacheEntry {
    /// Check if the entry is still inside the freshness window
    pub fn is_fresh(&self, window: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.verified_at);
        // A negative age means the clock moved backwards; re-verify
        age.to_std().is_ok_and(|age| age < window)
    }
}

/// Process-wide single-slot cache
///
/// Cloning shares the slot. Only the coordinator writes or clears it;
/// bindings read it to seed their first view.
#[derive(Debug, Clone)]
pub struct SessionCache {
    slot: Arc<RwLock<Option<SessionCacheEntry>>>,
    freshness_window: Duration,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_FRESHNESS_WINDOW))
    }
}

impl SessionCache {
    pub fn new(freshness_window: Duration) -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
            freshness_window,
        }
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Hit only for the exact credential and only while fresh
    pub fn read(&self, credential: &str) -> Option<UserProfile> {
        let slot = self.slot.read();
        match slot.as_ref() {
            Some(entry) if entry.credential == credential && entry.is_fresh(self.freshness_window) => {
                Some(entry.user.clone())
            }
            _ => None,
        }
    }

    /// Replace the slot
    pub fn write(&self, credential: &str, user: UserProfile) {
        *self.slot.write() = Some(SessionCacheEntry {
            credential: credential.to_string(),
            user,
            verified_at: Utc::now(),
        });
    }

    pub fn clear(&self) {
        self.slot.write().take();
    }

    /// Current entry regardless of freshness
    pub fn entry(&self) -> Option<SessionCacheEntry> {
        self.slot.read().clone()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, by: chrono::Duration) {
        if let Some(entry) = self.slot.write().as_mut() {
            entry.verified_at -= by;
        }
    }
}
