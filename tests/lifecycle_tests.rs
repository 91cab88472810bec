//! Entry lifecycle tests: fresh, stale, expired

use std::sync::Arc;
use std::time::Duration;

use tutorcache::{CacheConfig, CacheSettings, CacheStore, ManualClock, ResourceType};

fn store_at(start_ms: u64) -> (CacheStore<Vec<&'static str>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_ms));
    (CacheStore::with_clock(CacheSettings::default(), clock.clone()), clock)
}

#[test]
fn test_get_after_set_is_fresh() {
    let (store, _) = store_at(0);
    store.set("tutors:{}", vec!["tutorA"], Some(ResourceType::Tutors));

    let lookup = store.get("tutors:{}");
    assert_eq!(lookup.data, Some(vec!["tutorA"]));
    assert!(!lookup.is_stale);
    assert!(!lookup.is_expired);
}

#[test]
fn test_entry_goes_stale_then_expires() {
    let (store, clock) = store_at(10_000);
    store.set_with_config(
        "/reviews/3:{}",
        vec!["great tutor"],
        Some(ResourceType::Reviews),
        Some(CacheConfig::new(1_000, 5_000, true)),
    );

    // Boundaries are exclusive: exactly at stale_at is still fresh
    clock.advance(Duration::from_millis(1_000));
    assert!(store.get("/reviews/3:{}").is_fresh());

    clock.advance(Duration::from_millis(1));
    let lookup = store.get("/reviews/3:{}");
    assert_eq!(lookup.data, Some(vec!["great tutor"]));
    assert!(lookup.is_stale);
    assert!(!lookup.is_expired);

    clock.set(15_001);
    let lookup = store.get("/reviews/3:{}");
    assert_eq!(lookup.data, None);
    assert!(lookup.is_expired);

    // Removed, so the next read misses too
    assert!(!store.contains_key("/reviews/3:{}"));
    assert!(store.get("/reviews/3:{}").is_expired);
}

#[test]
fn test_overwrite_resets_timestamps() {
    let (store, clock) = store_at(0);
    store.set("/bookings:{}", vec!["b1"], Some(ResourceType::Bookings));
    clock.advance(Duration::from_secs(90));
    assert!(store.get("/bookings:{}").is_stale);

    store.set("/bookings:{}", vec!["b1", "b2"], Some(ResourceType::Bookings));
    let entry = store.peek("/bookings:{}").unwrap();
    assert_eq!(entry.created_at, 90_000);
    assert_eq!(entry.stale_at, 150_000);
    assert_eq!(entry.expires_at, 390_000);
    assert!(store.get("/bookings:{}").is_fresh());
}

#[test]
fn test_resource_policies_differ() {
    let (store, clock) = store_at(0);
    store.set("/messages/1:{}", vec!["hello"], Some(ResourceType::Messages));
    store.set("/subjects:{}", vec!["math"], Some(ResourceType::Subjects));

    clock.advance(Duration::from_secs(61));
    assert!(store.get("/messages/1:{}").is_expired);
    assert!(store.get("/subjects:{}").is_fresh());
}

#[test]
fn test_delete_and_clear() {
    let (store, _) = store_at(0);
    store.set("a:{}", vec!["a"], None);
    store.set("b:{}", vec!["b"], None);

    assert!(store.delete("a:{}"));
    assert!(!store.delete("a:{}"));
    assert_eq!(store.len(), 1);

    store.clear();
    assert!(store.is_empty());
}

#[cfg(feature = "stats")]
#[test]
fn test_stats_track_lookups() {
    let (store, clock) = store_at(0);
    store.set("/tutors:{}", vec!["tutorA"], Some(ResourceType::Tutors));

    store.get("/tutors:{}");
    clock.advance(Duration::from_secs(301));
    store.get("/tutors:{}");
    store.get("/nothing:{}");

    let stats = store.stats();
    assert_eq!(stats.hits(), 2);
    assert_eq!(stats.stale_hits(), 1);
    assert_eq!(stats.misses(), 1);
    assert_eq!(stats.total_accesses(), 3);
}
