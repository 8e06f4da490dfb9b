//! Delivery attempt tracking for redelivered push messages.
//!
//! Counts delivery attempts per message id so the webhook can stop forwarding
//! a message that keeps coming back. Counts live in process memory only and
//! reset on restart. Because the server is long-lived the map is bounded:
//! entries expire a fixed time after first sight and the oldest entry is
//! evicted once capacity is exceeded.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Bounds for the tracker's map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Maximum number of message ids remembered at once.
    pub capacity: usize,
    /// How long a message id is remembered after its first delivery.
    pub ttl: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl: Duration::from_secs(24 * 60 * 60), // 24 hours
        }
    }
}

/// Result of admitting one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Attempt number of this delivery (1 for the first sight).
    pub attempt: u32,
    /// True when earlier deliveries already used up the cap.
    pub exhausted: bool,
}

#[derive(Debug)]
struct Entry {
    attempts: u32,
    first_seen: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Message ids in first-seen order, which is also expiry order.
    order: VecDeque<(String, Instant)>,
}

impl Inner {
    fn live_count(&mut self, message_id: &str, now: Instant, ttl: Duration) -> u32 {
        match self.entries.get(message_id) {
            Some(entry) if now.duration_since(entry.first_seen) < ttl => entry.attempts,
            Some(_) => {
                // Expired; the stale `order` record is skipped when popped.
                self.entries.remove(message_id);
                0
            }
            None => 0,
        }
    }

    fn increment(&mut self, message_id: &str, now: Instant, config: &TrackerConfig) -> u32 {
        self.live_count(message_id, now, config.ttl);

        let attempts = match self.entries.get_mut(message_id) {
            Some(entry) => {
                entry.attempts += 1;
                entry.attempts
            }
            None => {
                self.entries.insert(
                    message_id.to_string(),
                    Entry { attempts: 1, first_seen: now },
                );
                self.order.push_back((message_id.to_string(), now));
                1
            }
        };

        self.evict(now, config);
        attempts
    }

    fn evict(&mut self, now: Instant, config: &TrackerConfig) {
        while let Some((_, first_seen)) = self.order.front() {
            if now.duration_since(*first_seen) < config.ttl {
                break;
            }
            self.pop_oldest();
        }

        while self.entries.len() > config.capacity {
            if !self.pop_oldest() {
                break;
            }
        }
    }

    /// Drop the oldest order record and its entry if it still belongs to it.
    fn pop_oldest(&mut self) -> bool {
        let Some((message_id, first_seen)) = self.order.pop_front() else {
            return false;
        };
        let owned = self
            .entries
            .get(&message_id)
            .is_some_and(|entry| entry.first_seen == first_seen);
        if owned {
            self.entries.remove(&message_id);
        }
        true
    }
}

/// Thread-safe, bounded attempt counter keyed by message id.
#[derive(Debug, Default)]
pub struct RetryTracker {
    config: TrackerConfig,
    inner: Mutex<Inner>,
}

impl RetryTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Attempts recorded for `message_id`; 0 if unseen or expired.
    pub fn attempt_count(&self, message_id: &str) -> u32 {
        let now = Instant::now();
        self.inner.lock().live_count(message_id, now, self.config.ttl)
    }

    /// Record one delivery attempt and return the new count.
    ///
    /// Must be called once per delivery, before processing starts, so a crash
    /// mid-processing still counts toward the cap.
    pub fn record_attempt(&self, message_id: &str) -> u32 {
        let now = Instant::now();
        self.inner.lock().increment(message_id, now, &self.config)
    }

    /// True once `message_id` has been attempted at least `max_attempts` times.
    pub fn should_abandon(&self, message_id: &str, max_attempts: u32) -> bool {
        self.attempt_count(message_id) >= max_attempts
    }

    /// Check the cap and record this attempt under a single lock.
    ///
    /// The delivery is `exhausted` when `max_attempts` deliveries were already
    /// recorded before it, so exactly `max_attempts` deliveries get through.
    pub fn admit(&self, message_id: &str, max_attempts: u32) -> Admission {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let prior = inner.live_count(message_id, now, self.config.ttl);
        let attempt = inner.increment(message_id, now, &self.config);
        Admission {
            attempt,
            exhausted: prior >= max_attempts,
        }
    }

    /// Number of message ids currently remembered.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
