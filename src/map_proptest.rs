#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate. Three variants
// share one driver: the default hasher, a constant hasher (every key in one
// chain), and a small load factor (a resize on almost every insert).

use crate::map::{ChainedHashMap, EntryRef};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length. The pool may
// contain `None`, the null key.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Find(usize),
    SetValue(usize, i32),
    Mutate(usize, i32),
    Contains(usize),
    Views,
    Iterate,
}

fn key_from(pool: &[Option<String>], i: usize) -> Option<String> {
    pool[i].clone()
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Option<String>>, Vec<OpI>)> {
    proptest::collection::vec(proptest::option::weighted(0.85, "[a-z]{0,5}"), 1..=8).prop_flat_map(
        |pool| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let op = prop_oneof![
                (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
                idx.clone().prop_map(OpI::Remove),
                idx.clone().prop_map(OpI::Get),
                idx.clone().prop_map(OpI::Find),
                (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::SetValue(i, v)),
                (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
                idx.clone().prop_map(OpI::Contains),
                Just(OpI::Views),
                Just(OpI::Iterate),
            ];
            proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
        },
    )
}

// State-machine equivalence against std::collections::HashMap. Invariants
// exercised across random operation sequences:
// - insert returns the model's prior value (None for fresh keys) and
//   overwrites never change len.
// - remove returns the model's value and is a no-op on absent keys.
// - get/find/contains parity with the model, null key included.
// - keys() has no duplicates and matches the model's key set; values()
//   matches as a multiset; entries() has cardinality len().
// - EntryRef handles track their entry across overwrites and resizes;
//   stale handles never resolve again.
// - capacity() stays a power of two through every resize.
fn run_ops<S>(
    mut sut: ChainedHashMap<String, i32, S>,
    pool: &[Option<String>],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Option<String>, i32> = HashMap::new();
    let mut live: HashMap<Option<String>, EntryRef> = HashMap::new();
    let mut stale: Vec<EntryRef> = Vec::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let expected = model.insert(k.clone(), v);
                let got = sut.insert(k.clone(), v);
                prop_assert_eq!(got, expected, "insert must return the prior value");
                let r = sut.find(k.as_ref()).expect("inserted key must be found");
                live.insert(k, r);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                let expected = model.remove(&k);
                let got = sut.remove(k.as_ref());
                prop_assert_eq!(got, expected);
                if expected.is_some() {
                    let r = live.remove(&k).expect("live handle tracked for present key");
                    stale.push(r);
                }
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(k.as_ref()), model.get(&k));
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(k.as_ref());
                prop_assert_eq!(found.is_some(), model.contains_key(&k));
                if let Some(r) = found {
                    prop_assert_eq!(Some(&r), live.get(&k), "find must return the live handle");
                }
            }
            OpI::SetValue(i, v) => {
                let k = key_from(pool, i);
                if let Some(&r) = live.get(&k) {
                    let prior = r.set_value(&mut sut, v);
                    prop_assert_eq!(prior, model.insert(k, v));
                }
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(&r) = live.get(&k) {
                    if let Some(vr) = r.value_mut(&mut sut) {
                        *vr = vr.saturating_add(d);
                        let mv = model.get_mut(&k).expect("present in model");
                        *mv = mv.saturating_add(d);
                    } else {
                        prop_assert!(false, "live handle must resolve");
                    }
                }
            }
            OpI::Contains(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.contains_key(k.as_ref()), model.contains_key(&k));
            }
            OpI::Views => {
                prop_assert_eq!(sut.entries().len(), model.len());
                prop_assert_eq!(sut.keys().len(), model.len(), "keys() must not duplicate");
                let keys: BTreeSet<Option<String>> =
                    sut.keys().into_iter().map(|k| k.cloned()).collect();
                let model_keys: BTreeSet<Option<String>> = model.keys().cloned().collect();
                prop_assert_eq!(keys, model_keys);

                let mut values: Vec<i32> = sut.values().into_iter().copied().collect();
                values.sort_unstable();
                let mut model_values: Vec<i32> = model.values().copied().collect();
                model_values.sort_unstable();
                prop_assert_eq!(values, model_values);
            }
            OpI::Iterate => {
                let keys: BTreeSet<Option<String>> =
                    sut.iter().map(|(_, k, _)| k.cloned()).collect();
                let model_keys: BTreeSet<Option<String>> = model.keys().cloned().collect();
                prop_assert_eq!(keys, model_keys);
            }
        }

        // Post-conditions after each op
        for &r in &stale {
            prop_assert!(r.value(&sut).is_none(), "stale handle must not resolve");
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.capacity().is_power_of_two());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_ops(ChainedHashMap::new(), &pool, ops)?;
    }
}

// Collision variant: a constant hasher sends every key (and the null key)
// into bucket 0, so each operation walks one long chain.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_ops(ChainedHashMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Churn variant: a tiny table and a small load factor make nearly every
// insert cross the threshold, so chains are rebuilt constantly and sizes
// oscillate both up and down.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_resize_churn((pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_load_factor(4, 0.3).unwrap();
        run_ops(sut, &pool, ops)?;
    }
}
