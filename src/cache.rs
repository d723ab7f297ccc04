//! In-memory query cache with per-entry TTL and FIFO eviction.
//!
//! Memoizes the pipeline's expensive steps — tool-search lookups, schema
//! fetches, and tool invocations — so a repeated question does not trigger
//! redundant backend round-trips. Entries expire lazily: an expired key is
//! removed on `get` (and counted as a miss), and `set` sweeps any other
//! expired entries before checking capacity.
//!
//! Eviction is FIFO by insertion timestamp, not LRU. TTL already bounds
//! staleness, so the simpler policy is kept on purpose; re-`set` of an
//! existing key refreshes its insertion timestamp.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default capacity bound when the config does not override it.
pub const DEFAULT_CAPACITY: usize = 128;

/// Default TTL for entries stored without an explicit one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// One cached value. Mutated only by `get` (hit count) and `set`/eviction.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
    hit_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= self.ttl
    }
}

/// Hit/miss accounting, exposed over the CLI and the HTTP surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Key/value store with per-entry TTL, a capacity bound, and FIFO eviction.
///
/// Plain single-threaded struct; the pipeline shares it behind
/// `Arc<Mutex<QueryCache>>`, holding the lock only across individual map
/// operations.
#[derive(Debug)]
pub struct QueryCache {
    entries: HashMap<String, CacheEntry>,
    capacity: usize,
    default_ttl: Duration,
    hits: u64,
    misses: u64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

impl QueryCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            default_ttl,
            hits: 0,
            misses: 0,
        }
    }

    /// Store `value` under `key`. Sweeps expired entries first, then evicts
    /// the single oldest-inserted entry if the cache is at capacity.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let key = key.into();
        let now = Instant::now();
        self.entries.retain(|_, e| !e.is_expired(now));

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                ttl: ttl.unwrap_or(self.default_ttl),
                hit_count: 0,
            },
        );
    }

    /// Fetch a live entry. An expired entry is removed and counts as a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.hit_count += 1;
                self.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// True when a live (non-expired) entry exists. Does not touch counters.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries.get(key).is_some_and(|e| !e.is_expired(now))
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate,
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.created_at)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

// ── Key builders ──────────────────────────────────────────────────────────────
//
// Key construction is the caller's responsibility; these three builders are
// the only shapes the pipeline uses. Arguments are serialized with sorted
// object keys so identical calls produce identical keys regardless of map
// insertion order.

/// Cache key for a tool-search lookup.
pub fn search_key(query: &str, filters: &Value) -> String {
    format!("search:{query}:{}", canonical_json(filters))
}

/// Cache key for a tool invocation.
pub fn tool_key(name: &str, args: &serde_json::Map<String, Value>) -> String {
    let mut keys: Vec<&String> = args.keys().collect();
    keys.sort();
    let mut sorted = serde_json::Map::new();
    for k in keys {
        sorted.insert(k.clone(), args[k].clone());
    }
    format!("mcp:{name}:{}", canonical_json(&Value::Object(sorted)))
}

/// Cache key for the search-index schema snapshot.
pub fn schema_key() -> &'static str {
    "schema:snapshot"
}

/// JSON encoding with recursively sorted object keys.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", serde_json::to_string(k).unwrap_or_default(), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_returns_live_entries_only() {
        let mut cache = QueryCache::new(10, Duration::from_millis(20));
        cache.set("k", json!(1), None);
        assert_eq!(cache.get("k"), Some(json!(1)));

        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("k"), None);
        assert!(!cache.has("k"), "expired entry must be purged");
    }

    #[test]
    fn eviction_removes_oldest_inserted() {
        let mut cache = QueryCache::new(3, Duration::from_secs(60));
        cache.set("a", json!(1), None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("b", json!(2), None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("c", json!(3), None);
        std::thread::sleep(Duration::from_millis(2));
        cache.set("d", json!(4), None);

        assert!(!cache.has("a"), "oldest entry should have been evicted");
        assert!(cache.has("b"));
        assert!(cache.has("c"));
        assert!(cache.has("d"));
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let mut cache = QueryCache::default();
        cache.set("k", json!("v"), None);
        cache.get("k");
        cache.get("k");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn tool_key_is_argument_order_independent() {
        let mut a = serde_json::Map::new();
        a.insert("b".into(), json!(2));
        a.insert("a".into(), json!(1));

        let mut b = serde_json::Map::new();
        b.insert("a".into(), json!(1));
        b.insert("b".into(), json!(2));

        assert_eq!(tool_key("GetSales", &a), tool_key("GetSales", &b));
    }

    #[test]
    fn nested_filters_sort_recursively() {
        let f1 = json!({"z": {"b": 1, "a": 2}, "y": 3});
        let f2 = json!({"y": 3, "z": {"a": 2, "b": 1}});
        assert_eq!(search_key("q", &f1), search_key("q", &f2));
    }
}
