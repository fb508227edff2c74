use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub const DEFAULT_CAPACITY: usize = 10_000;

// Cached decision, tagged with the directory revision it was computed at
#[derive(Clone, Copy, Debug)]
pub struct CacheEntry {
    pub allowed: bool,
    pub revision: u64,
}

/// Memo of `(user_id, slug) -> allowed`.
///
/// An entry only answers while the directory revision matches the one it was
/// stored under. Seeing a newer revision, or filling up, drops everything.
#[derive(Debug)]
pub struct PermissionCache {
    entries: DashMap<(String, String), CacheEntry>,
    revision: AtomicU64,
    count: AtomicUsize, // approximate, only steers the capacity check
    capacity: usize,
}

impl Default for PermissionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            revision: AtomicU64::new(0),
            count: AtomicUsize::new(0),
            capacity: capacity.max(1),
        }
    }

    fn clear(&self) {
        self.entries.clear();
        self.count.store(0, Ordering::SeqCst);
    }

    fn sync(&self, revision: u64) {
        if self.revision.swap(revision, Ordering::SeqCst) != revision {
            self.clear();
        }
    }

    pub fn get(&self, user_id: &str, slug: &str, revision: u64) -> Option<bool> {
        self.sync(revision);
        self.entries
            .get(&(user_id.to_owned(), slug.to_owned()))
            .filter(|entry| entry.revision == revision)
            .map(|entry| entry.allowed)
    }

    pub fn insert(&self, user_id: &str, slug: &str, revision: u64, allowed: bool) {
        if self.count.load(Ordering::SeqCst) >= self.capacity {
            self.clear();
        }
        let previous = self.entries.insert(
            (user_id.to_owned(), slug.to_owned()),
            CacheEntry { allowed, revision },
        );
        if previous.is_none() {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_revision_misses() {
        let cache = PermissionCache::new();
        assert_eq!(cache.get("alice", "news.create", 0), None);

        cache.insert("alice", "news.create", 0, true);
        assert_eq!(cache.get("alice", "news.create", 0), Some(true));

        assert_eq!(cache.get("alice", "news.create", 1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_from_older_revision_is_ignored() {
        let cache = PermissionCache::new();
        cache.get("x", "y.z", 5);
        // computed before a mutation landed
        cache.insert("alice", "news.create", 4, true);
        assert_eq!(cache.get("alice", "news.create", 5), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stays_within_capacity() {
        let cache = PermissionCache::with_capacity(100);
        for i in 0..50_000 {
            cache.insert("ghost", &format!("junk.s{i}"), 0, false);
            assert!(cache.len() <= 100);
        }
        // the most recent answer is still there after a wrap
        assert_eq!(cache.get("ghost", "junk.s49999", 0), Some(false));
    }

    #[test]
    fn overwriting_does_not_count_twice() {
        let cache = PermissionCache::with_capacity(2);
        for _ in 0..10 {
            cache.insert("alice", "news.create", 0, true);
        }
        cache.insert("bob", "news.create", 0, false);
        assert_eq!(cache.len(), 2);
    }
}
