use std::thread::sleep;
use std::time::Duration;

use serde_json::{json, Map};

use stocktalk::cache::{search_key, tool_key, QueryCache};

#[test]
fn identical_calls_share_a_key_regardless_of_argument_order() {
    let mut forward = Map::new();
    forward.insert("category".to_string(), json!("Dairy"));
    forward.insert("threshold".to_string(), json!(30));

    let mut reversed = Map::new();
    reversed.insert("threshold".to_string(), json!(30));
    reversed.insert("category".to_string(), json!("Dairy"));

    assert_eq!(
        tool_key("GetProducts", &forward),
        tool_key("GetProducts", &reversed)
    );
}

#[test]
fn different_arguments_get_different_keys() {
    let mut a = Map::new();
    a.insert("category".to_string(), json!("Dairy"));
    let mut b = Map::new();
    b.insert("category".to_string(), json!("Meat"));

    assert_ne!(tool_key("GetProducts", &a), tool_key("GetProducts", &b));
}

#[test]
fn nested_filters_are_canonicalized_too() {
    let a = search_key("q", &json!({"outer": {"b": 1, "a": 2}}));
    let b = search_key("q", &json!({"outer": {"a": 2, "b": 1}}));
    assert_eq!(a, b);
}

#[test]
fn expired_entry_counts_as_miss_and_is_removed() {
    let mut cache = QueryCache::new(8, Duration::from_millis(10));
    cache.set("k", json!(1), None);
    sleep(Duration::from_millis(25));

    assert_eq!(cache.get("k"), None);
    let stats = cache.stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.misses, 1);
}

#[test]
fn capacity_evicts_the_oldest_insertion() {
    let mut cache = QueryCache::new(2, Duration::from_secs(60));
    cache.set("a", json!(1), None);
    sleep(Duration::from_millis(2));
    cache.set("b", json!(2), None);
    sleep(Duration::from_millis(2));
    cache.set("c", json!(3), None);

    assert!(!cache.has("a"), "oldest entry is evicted first");
    assert!(cache.has("b"));
    assert!(cache.has("c"));
}

#[test]
fn re_set_refreshes_a_keys_age() {
    let mut cache = QueryCache::new(2, Duration::from_secs(60));
    cache.set("a", json!(1), None);
    sleep(Duration::from_millis(2));
    cache.set("b", json!(2), None);
    sleep(Duration::from_millis(2));
    // "a" becomes the newest entry again.
    cache.set("a", json!(10), None);
    sleep(Duration::from_millis(2));
    cache.set("c", json!(3), None);

    assert!(cache.has("a"));
    assert!(!cache.has("b"));
}
