//! Integration tests for the rolling store and exposition rendering.
//!
//! These exercise the accumulation contract through the public API:
//! newest-wins deduplication, the bounded-retention invariant, and the
//! determinism of rendered output.

use ostinato::measure::HASH_LABEL;
use ostinato::{Measurement, RollingStore, render};

/// Helper producing a labelled latency measurement.
fn latency(host: &str, value: f64) -> Measurement {
    Measurement::new("svc_latency", value).with_label("host", host)
}

#[test]
fn test_accumulate_roll_accumulate() {
    let mut store = RollingStore::new(2);

    // Phase 1: two distinct series land in the current generation.
    store.insert(latency("a", 1.0));
    store.insert(latency("b", 2.0));
    assert_eq!(store.len(), 2);

    // Phase 2: rotation keeps both visible from the older generation.
    store.roll();
    assert_eq!(store.dump().len(), 2);

    // Phase 3: a re-report after rotation wins over the older copy.
    store.insert(latency("a", 10.0));
    let dumped = store.dump();
    assert_eq!(dumped.len(), 2);
    let a = dumped.iter().find(|m| m.labels["host"] == "a").unwrap();
    assert_eq!(a.value, 10.0);

    // Phase 4: a second rotation drops the untouched series entirely.
    store.roll();
    let dumped = store.dump();
    assert_eq!(dumped.len(), 1);
    assert_eq!(dumped[0].labels["host"], "a");
}

#[test]
fn test_retention_bound_across_generation_counts() {
    for generations in 1..=4 {
        let mut store = RollingStore::new(generations);
        store.insert(latency("a", 1.0));

        // Visible through generation_count - 1 rotations...
        for _ in 0..generations - 1 {
            store.roll();
            assert_eq!(store.dump().len(), 1, "generations={generations}");
        }
        // ...and gone on the next.
        store.roll();
        assert!(store.dump().is_empty(), "generations={generations}");
    }
}

#[test]
fn test_dump_feeds_deterministic_render() {
    let mut store = RollingStore::new(2);
    store.insert(latency("b", 2.0));
    store.insert(latency("a", 1.0));
    store.roll();
    store.insert(latency("c", 3.0));

    // dump() order is unspecified; rendering sorts it away.
    let first = render(&store.dump());
    let second = render(&store.dump());
    assert_eq!(first, second);

    let a = first.find("host=\"a\"").unwrap();
    let b = first.find("host=\"b\"").unwrap();
    let c = first.find("host=\"c\"").unwrap();
    assert!(a < b && b < c);
}

#[test]
fn test_stamped_hash_is_a_stable_lookup_key() {
    let mut store = RollingStore::new(2);
    store.insert(latency("a", 1.0));

    let stamped = store.dump()[0].labels[HASH_LABEL].clone();
    assert_eq!(store.get(&stamped).unwrap().value, 1.0);

    // Re-reporting the same series keeps the same key.
    store.insert(latency("a", 5.0));
    assert_eq!(store.get(&stamped).unwrap().value, 5.0);
}
