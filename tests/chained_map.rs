// ChainedHashMap behavioral suite (consolidated).
//
// Each test documents what behavior is being verified and which invariants
// are assumed or asserted. The core invariants exercised:
// - Size: len() equals the number of distinct keys inserted and never
//   drifts across overwrites, removals, or resizes.
// - Overwrite: inserting an existing key returns the prior value and
//   changes nothing structurally.
// - Null key: `None` is a single, ordinary entry that overwrites in place.
// - Resize: crossing the load-factor threshold replaces the table without
//   losing or duplicating entries; capacity stays a power of two.
// - Views: entries()/keys()/values() agree with len(); entries are live
//   and write through to the stored values.
use chained_hashmap::{ChainedHashMap, ConfigError};
use std::hash::{BuildHasher, Hasher};

// Test: the basic put/delete scenario.
// Assumes: an empty map reports len 0 and misses return None.
// Verifies: after insert a, insert b, remove a: get(a) is None, get(b) is
// the stored value, len is 1.
#[test]
fn scenario_insert_insert_remove() {
    let mut m: ChainedHashMap<String, String> = ChainedHashMap::new();
    assert!(m.is_empty());

    m.insert(Some("a".to_string()), "1".to_string());
    m.insert(Some("b".to_string()), "2".to_string());
    assert_eq!(m.len(), 2);

    assert_eq!(m.remove(Some("a")), Some("1".to_string()));
    assert_eq!(m.get(Some("a")), None);
    assert_eq!(m.get(Some("b")), Some(&"2".to_string()));
    assert_eq!(m.len(), 1);
}

// Test: overwrite semantics.
// Assumes: keys compare by Eq, not identity.
// Verifies: the second insert returns the first value and len stays 1.
#[test]
fn overwrite_returns_prior_value() {
    let mut m: ChainedHashMap<String, String> = ChainedHashMap::new();
    assert_eq!(m.insert(Some("1".to_string()), "One".to_string()), None);
    assert_eq!(
        m.insert(Some("1".to_string()), "Two".to_string()),
        Some("One".to_string())
    );
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(Some("1")), Some(&"Two".to_string()));
}

// Test: removal result and idempotence.
// Assumes: remove returns the stored value on the first call.
// Verifies: a second remove of the same key returns None and len does not
// go below zero.
#[test]
fn remove_is_idempotent() {
    let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
    m.insert(Some("k".to_string()), 7);
    assert_eq!(m.remove(Some("k")), Some(7));
    assert_eq!(m.remove(Some("k")), None);
    assert_eq!(m.remove(Some("k")), None);
    assert_eq!(m.len(), 0);
}

// Test: bulk insertion across many resizes.
// Assumes: the table starts at 16 slots with load factor 0.75.
// Verifies: 10000 distinct keys are all retrievable with their latest
// values; len is 10000; the growth sequence lands on 16384 slots (each
// resize doubles the entry count at the moment the threshold is crossed).
#[test]
fn ten_thousand_inserts_all_retrievable() {
    let mut m: ChainedHashMap<String, usize> = ChainedHashMap::new();
    for i in 0..10_000 {
        m.insert(Some(i.to_string()), i);
    }
    assert_eq!(m.len(), 10_000);
    assert_eq!(m.capacity(), 16_384);
    for i in 0..10_000 {
        assert_eq!(m.get(Some(i.to_string().as_str())), Some(&i));
    }
}

// Test: the null key under repeated writes, including a "present with no
// value" payload.
// Assumes: `None` keys hash to 0 and occupy a single entry.
// Verifies: twenty overwrites leave one entry; storing V = Option with
// None is distinguishable from absence (get returns Some(&None)).
#[test]
fn null_key_overwrites_and_null_value() {
    let mut m: ChainedHashMap<String, Option<i32>> = ChainedHashMap::new();
    for i in 0..20 {
        let prior = m.insert(None, Some(i));
        if i == 0 {
            assert_eq!(prior, None);
        } else {
            assert_eq!(prior, Some(Some(i - 1)));
        }
    }
    assert_eq!(m.len(), 1);

    assert_eq!(m.insert(None, None), Some(Some(19)));
    assert_eq!(m.get(None::<&str>), Some(&None));
    assert_eq!(m.len(), 1);

    assert_eq!(m.remove(None::<&str>), Some(None));
    assert_eq!(m.get(None::<&str>), None);
}

// Test: the fully parameterized constructor.
// Assumes: capacity rounds up to a power of two; threshold is
// floor(capacity * load_factor).
// Verifies: (55, 0.4) starts at 64 slots, survives 100 inserts with every
// key retrievable, and ends at 256 slots.
#[test]
fn constructor_with_capacity_and_load_factor() {
    let mut m: ChainedHashMap<String, usize> =
        ChainedHashMap::with_load_factor(55, 0.4).expect("valid load factor");
    assert_eq!(m.capacity(), 64);
    assert_eq!(m.load_factor(), 0.4);

    for i in 0..100 {
        m.insert(Some(i.to_string()), i);
    }
    assert_eq!(m.len(), 100);
    assert_eq!(m.capacity(), 256);
    for i in 0..100 {
        assert_eq!(m.get(Some(i.to_string().as_str())), Some(&i));
    }
}

// Test: capacity-only constructor.
// Verifies: a request of 9 rounds up to 16 slots.
#[test]
fn constructor_rounds_capacity_up() {
    let m: ChainedHashMap<String, i32> = ChainedHashMap::with_capacity(9);
    assert_eq!(m.capacity(), 16);
}

// Test: constructor validation.
// Verifies: zero, negative, and NaN load factors are rejected with
// InvalidLoadFactor and no map is produced.
#[test]
fn invalid_load_factors_rejected() {
    for lf in [0.0, -0.75, f64::NAN] {
        match ChainedHashMap::<String, i32>::with_load_factor(16, lf) {
            Err(ConfigError::InvalidLoadFactor(got)) => {
                assert!(got == lf || (got.is_nan() && lf.is_nan()));
            }
            Ok(_) => panic!("load factor {lf} must be rejected"),
        }
    }
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Test: two keys forced into the same bucket.
// Assumes: a constant hasher puts every key in bucket 0.
// Verifies: both entries coexist in one chain, resolve independently by
// Eq, and removing one leaves the other reachable.
#[test]
fn colliding_keys_share_a_bucket() {
    let mut m: ChainedHashMap<String, i32, ConstBuildHasher> =
        ChainedHashMap::with_hasher(ConstBuildHasher);
    m.insert(Some("Aa".to_string()), 1);
    m.insert(Some("BB".to_string()), 2);
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(Some("Aa")), Some(&1));
    assert_eq!(m.get(Some("BB")), Some(&2));

    assert_eq!(m.remove(Some("Aa")), Some(1));
    assert_eq!(m.get(Some("Aa")), None);
    assert_eq!(m.get(Some("BB")), Some(&2));
}

// Test: entries() is a live view.
// Assumes: entries() returns one handle per entry.
// Verifies: writing through every handle is visible to subsequent gets,
// and the prior values come back from set_value.
#[test]
fn entries_write_through_in_bulk() {
    let mut m: ChainedHashMap<String, String> = ChainedHashMap::new();
    for k in ["a", "b", "c", "d"] {
        m.insert(Some(k.to_string()), k.to_uppercase());
    }
    m.insert(None, "NULL".to_string());

    let handles = m.entries();
    assert_eq!(handles.len(), m.len());
    for r in handles {
        assert!(r.set_value(&mut m, "none".to_string()).is_some());
    }

    for k in ["a", "b", "c", "d"] {
        assert_eq!(m.get(Some(k)), Some(&"none".to_string()));
    }
    assert_eq!(m.get(None::<&str>), Some(&"none".to_string()));
}

// Test: keys() view.
// Verifies: cardinality equals len() with the null key counted once, and
// no key appears twice.
#[test]
fn keys_view_has_no_duplicates() {
    let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
    m.insert(Some("x".to_string()), 1);
    m.insert(Some("y".to_string()), 2);
    m.insert(None, 3);
    m.insert(Some("x".to_string()), 4);
    m.insert(None, 5);

    let keys = m.keys();
    assert_eq!(keys.len(), 3);
    assert_eq!(m.len(), 3);
    let mut owned: Vec<Option<String>> = keys.into_iter().map(|k| k.cloned()).collect();
    owned.sort();
    owned.dedup();
    assert_eq!(owned.len(), 3);
}

// Test: values() view.
// Verifies: duplicate values are kept; cardinality equals len().
#[test]
fn values_view_keeps_duplicates() {
    let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
    m.insert(Some("a".to_string()), 9);
    m.insert(Some("b".to_string()), 9);
    m.insert(Some("c".to_string()), 1);

    let mut values: Vec<i32> = m.values().into_iter().copied().collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 9, 9]);
}

// Test: bulk mutation through iter_mut.
// Verifies: every value update is visible through get afterward.
#[test]
fn iter_mut_updates_are_visible() {
    let mut m: ChainedHashMap<String, i32> = ChainedHashMap::new();
    for (i, k) in ["p", "q", "r"].iter().enumerate() {
        m.insert(Some((*k).to_string()), i as i32);
    }
    for (_, _, v) in m.iter_mut() {
        *v *= 10;
    }
    assert_eq!(m.get(Some("p")), Some(&0));
    assert_eq!(m.get(Some("q")), Some(&10));
    assert_eq!(m.get(Some("r")), Some(&20));
}

// Test: handle stability across heavy growth.
// Assumes: resize relinks nodes without moving them between arena slots.
// Verifies: a handle taken before thousands of inserts still resolves to
// its entry afterward, and goes stale only on removal.
#[test]
fn handle_survives_heavy_growth() {
    let mut m: ChainedHashMap<String, usize> = ChainedHashMap::new();
    m.insert(Some("anchor".to_string()), 0);
    let r = m.find(Some("anchor")).expect("present");

    for i in 0..5_000 {
        m.insert(Some(format!("filler-{i}")), i);
    }
    assert_eq!(r.value(&m), Some(&0));
    assert_eq!(r.key(&m), Some(Some(&"anchor".to_string())));

    m.remove(Some("anchor"));
    assert_eq!(r.value(&m), None);
}
