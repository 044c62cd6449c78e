//! Time-bucketed, bounded cache of issued assertions.
//!
//! Entries only live for the newest window the cache has observed. Moving to
//! a newer window drops everything older, so memory is bounded by the number
//! of distinct subjects seen in one hour, capped at the configured capacity.

use crate::models::TimeWindow;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A token memoized for one subject in one window.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedAssertion {
    pub token: String,
    pub window: TimeWindow,
}

impl CachedAssertion {
    pub fn expires_at(&self) -> i64 {
        self.window.expires_at()
    }

    /// Valid while `now` falls inside the window the token was issued for.
    pub fn is_valid_at(&self, window: TimeWindow, now: i64) -> bool {
        self.window == window && now < self.expires_at()
    }
}

impl std::fmt::Debug for CachedAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedAssertion")
            .field("token", &"[REDACTED]")
            .field("window", &self.window)
            .finish()
    }
}

/// What happened to an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Stored,
    /// The entry belongs to a window older than the newest one seen.
    StaleWindow,
    /// The current window already holds `capacity` subjects.
    AtCapacity,
}

#[derive(Debug, Default)]
struct CacheInner {
    newest_window: Option<TimeWindow>,
    entries: HashMap<String, CachedAssertion>,
}

impl CacheInner {
    /// Move the cache forward to `window` if it is newer, dropping every
    /// entry from older windows. Returns false when `window` is stale.
    fn advance_to(&mut self, window: TimeWindow) -> bool {
        match self.newest_window {
            Some(newest) if window < newest => false,
            Some(newest) if window == newest => true,
            _ => {
                self.entries.clear();
                self.newest_window = Some(window);
                true
            }
        }
    }
}

#[derive(Debug)]
pub struct AssertionCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl AssertionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // The map holds plain data, so a writer that panicked cannot leave it
    // half-updated.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached token for `subject` if one is valid at `now`.
    pub fn get(&self, subject: &str, now: i64) -> Option<CachedAssertion> {
        let window = TimeWindow::containing_timestamp(now);
        let mut inner = self.lock();

        if !inner.advance_to(window) {
            return None;
        }

        inner
            .entries
            .get(subject)
            .filter(|cached| cached.is_valid_at(window, now))
            .cloned()
    }

    /// Store `assertion` for `subject`, overwriting any previous entry.
    pub fn insert(&self, subject: &str, assertion: CachedAssertion) -> InsertOutcome {
        let mut inner = self.lock();

        if !inner.advance_to(assertion.window) {
            return InsertOutcome::StaleWindow;
        }

        if !inner.entries.contains_key(subject) && inner.entries.len() >= self.capacity {
            return InsertOutcome::AtCapacity;
        }

        inner.entries.insert(subject.to_string(), assertion);
        InsertOutcome::Stored
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.lock().entries.contains_key(subject)
    }

    /// Newest window observed so far.
    pub fn newest_window(&self) -> Option<TimeWindow> {
        self.lock().newest_window
    }
}
