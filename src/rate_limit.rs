// Fixed-window request counting, one window per identifier, in process memory.
// Windows don't slide: a burst across a boundary can get 2 * max_requests through.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::{AppError, Result};

const LOGIN_PREFIX: &str = "login:";

// Rate limit entry - tracks requests per IP/key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

impl RateLimitConfig {
    /// Stricter limits for login attempts: 5 requests per 15 minutes.
    pub const LOGIN: RateLimitConfig = RateLimitConfig {
        window_ms: 15 * 60 * 1000,
        max_requests: 5,
    };

    pub fn new(window_ms: u64, max_requests: u32) -> Result<Self> {
        if window_ms == 0 {
            return Err(AppError::InvalidConfig("window must be > 0".into()));
        }
        if max_requests == 0 {
            return Err(AppError::InvalidConfig("max requests must be > 0".into()));
        }
        Ok(Self {
            window_ms,
            max_requests,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub limited: bool,
    pub remaining: u32,
    pub reset_time: u64,
}

impl RateLimitResult {
    // Whole seconds until the window resets, never less than 1
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_time.saturating_sub(now_ms).div_ceil(1000).max(1)
    }
}

pub fn login_key(identifier: &str) -> String {
    format!("{LOGIN_PREFIX}{identifier}")
}

pub struct RateLimitStore {
    entries: DashMap<String, RateLimitEntry>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RateLimitStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Record one request for `identifier` and report whether it is over the
    /// limit.
    ///
    /// The whole read-modify-write runs while holding the shard lock for the
    /// key, so concurrent callers sharing an identifier are serialized and
    /// cannot both slip under the limit.
    pub fn check(&self, identifier: &str, config: &RateLimitConfig) -> RateLimitResult {
        let now = self.clock.now_ms();
        let fresh = RateLimitEntry {
            count: 1,
            reset_at_ms: now.saturating_add(config.window_ms),
        };
        let opened = RateLimitResult {
            limited: false,
            remaining: config.max_requests.saturating_sub(1),
            reset_time: fresh.reset_at_ms,
        };

        match self.entries.entry(identifier.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                opened
            }
            // window over, start a new one with this request counted
            Entry::Occupied(mut slot) if slot.get().reset_at_ms < now => {
                slot.insert(fresh);
                opened
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.count = entry.count.saturating_add(1);

                if entry.count > config.max_requests {
                    RateLimitResult {
                        limited: true,
                        remaining: 0,
                        reset_time: entry.reset_at_ms,
                    }
                } else {
                    RateLimitResult {
                        limited: false,
                        remaining: config.max_requests - entry.count,
                        reset_time: entry.reset_at_ms,
                    }
                }
            }
        }
    }

    pub fn check_login(&self, identifier: &str) -> RateLimitResult {
        self.check(&login_key(identifier), &RateLimitConfig::LOGIN)
    }

    /// Drop every entry whose window has passed. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at_ms >= now);
        before.saturating_sub(self.entries.len())
    }

    #[cfg(test)]
    pub fn get(&self, identifier: &str) -> Option<RateLimitEntry> {
        self.entries.get(identifier).map(|e| *e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
