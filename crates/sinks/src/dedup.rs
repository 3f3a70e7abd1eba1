//! Time-bounded record of recently forwarded alert fingerprints.
//!
//! A fingerprint admitted by [`DedupCache::admit`] suppresses every later
//! event with the same fingerprint until the suppression window elapses.
//! The check and the insert happen under one lock, so of two identical
//! events racing through the cache exactly one is admitted.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::event::Event;

/// Default suppression window (5 minutes).
pub const DEFAULT_WINDOW_SECS: i64 = 300;

/// Default maximum number of tracked fingerprints.
pub const DEFAULT_CAPACITY: usize = 500;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Identity of an event for suppression purposes.
///
/// Each field is length-prefixed so that differently split values which
/// concatenate to the same text still produce distinct fingerprints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn of(event: &Event) -> Self {
        let fields = [
            event.event_type.as_str(),
            event.namespace.as_str(),
            event.name.as_str(),
            event.message.as_str(),
            event.reason.as_str(),
        ];

        let mut key = String::new();
        for field in fields {
            key.push_str(&field.len().to_string());
            key.push(':');
            key.push_str(field);
        }
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
struct Entries {
    /// fingerprint -> expiry
    expiries: HashMap<Fingerprint, DateTime<Utc>>,
    /// insertion order, oldest first
    order: VecDeque<(Fingerprint, DateTime<Utc>)>,
}

impl Entries {
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.expiries.len();
        self.expiries.retain(|_, expires_at| *expires_at > now);
        let expiries = &self.expiries;
        self.order
            .retain(|(fp, expires_at)| expiries.get(fp) == Some(expires_at));
        before - self.expiries.len()
    }

    fn evict_oldest(&mut self) {
        while let Some((fp, expires_at)) = self.order.pop_front() {
            // Skip queue slots superseded by a later re-insert
            if self.expiries.get(&fp) == Some(&expires_at) {
                self.expiries.remove(&fp);
                return;
            }
        }
    }
}

/// Fingerprint cache with per-entry expiry and a size cap.
pub struct DedupCache {
    entries: Mutex<Entries>,
    window: Duration,
    capacity: usize,
    clock: Box<dyn Clock>,
}

impl DedupCache {
    /// Create a cache driven by the wall clock.
    #[must_use]
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self::with_clock(window, capacity, SystemClock)
    }

    /// Create a cache driven by the given clock.
    #[must_use]
    pub fn with_clock(window: Duration, capacity: usize, clock: impl Clock + 'static) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            window,
            capacity: capacity.max(1),
            clock: Box::new(clock),
        }
    }

    /// Suppression window applied to new entries.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record `fingerprint` unless an unexpired entry already exists.
    ///
    /// Returns `true` when the caller should forward the event.
    pub async fn admit(&self, fingerprint: &Fingerprint) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        if entries
            .expiries
            .get(fingerprint)
            .is_some_and(|expires_at| *expires_at > now)
        {
            return false;
        }

        if entries.expiries.contains_key(fingerprint) {
            entries.order.retain(|(fp, _)| fp != fingerprint);
        } else if entries.expiries.len() >= self.capacity {
            entries.sweep(now);
            if entries.expiries.len() >= self.capacity {
                entries.evict_oldest();
            }
        }

        let expires_at = now + self.window;
        entries.expiries.insert(fingerprint.clone(), expires_at);
        entries.order.push_back((fingerprint.clone(), expires_at));
        true
    }

    /// Whether an unexpired entry exists for `fingerprint`.
    pub async fn contains(&self, fingerprint: &Fingerprint) -> bool {
        let now = self.clock.now();
        self.entries
            .lock()
            .await
            .expiries
            .get(fingerprint)
            .is_some_and(|expires_at| *expires_at > now)
    }

    /// Drop expired entries, returning how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        self.entries.lock().await.sweep(now)
    }

    /// Number of tracked entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.expiries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.expiries.is_empty()
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_WINDOW_SECS), DEFAULT_CAPACITY)
    }
}

impl fmt::Debug for DedupCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedupCache")
            .field("window", &self.window)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
