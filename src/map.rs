//! ChainedHashMap: bucket array, collision chains, and the resize policy.

use crate::hash::{index_for, spread};
use crate::reentry::ReentryCheck;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Bucket count used when a constructor is not given one (or is given 0).
pub const DEFAULT_CAPACITY: usize = 16;
/// Fill fraction that, once exceeded, triggers a resize.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
/// Largest bucket count the table will ever use.
pub const MAX_CAPACITY: usize = 1 << 30;

/// A live view of one entry: a copyable handle that stays valid until the
/// entry is removed, across any number of resizes.
///
/// A handle whose entry has been removed is stale: every accessor returns
/// `None`, and the handle never aliases a later insertion even if the
/// physical slot is reused (generational keys).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryRef(DefaultKey);

impl EntryRef {
    pub(crate) fn new(k: DefaultKey) -> Self {
        EntryRef(k)
    }
    pub(crate) fn raw(&self) -> DefaultKey {
        self.0
    }

    /// The entry's key. Outer `None` means the handle is stale; inner
    /// `None` is the null key.
    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<Option<&'a K>>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.entry_key(*self)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.entry_value(*self)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut ChainedHashMap<K, V, S>) -> Option<&'a mut V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.entry_value_mut(*self)
    }

    /// Writes `value` through to the stored entry and returns the prior
    /// value, or `None` if the handle is stale.
    pub fn set_value<K, V, S>(&self, map: &mut ChainedHashMap<K, V, S>, value: V) -> Option<V>
    where
        K: Eq + Hash,
        S: BuildHasher,
    {
        map.entry_set_value(*self, value)
    }
}

#[derive(Debug)]
struct Node<K, V> {
    hash: u64, // post-spread, cached; refreshed on resize
    key: Option<K>, // None is the null key
    value: V,
    next: Option<DefaultKey>,
}

/// Rejected constructor parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Load factor was zero, negative, or NaN.
    InvalidLoadFactor(f64),
}

/// A hash map built on separate chaining: a power-of-two bucket array where
/// each slot heads a singly linked chain of entries, stored in a
/// generational arena.
///
/// Keys are optional: `None` models the single permitted null key, which
/// always hashes to 0. Lookups accept borrowed forms of the key
/// (`Borrow<Q>`), and [`find`](Self::find) hands out [`EntryRef`] views for
/// in-place value mutation.
pub struct ChainedHashMap<K, V, S = RandomState> {
    hasher: S,
    table: Vec<Option<DefaultKey>>, // chain heads; length always a power of two
    nodes: SlotMap<DefaultKey, Node<K, V>>, // entry storage using generational keys
    load_factor: f64,
    threshold: usize, // resize once len() exceeds this
    reentry: ReentryCheck,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    /// An empty map with the default capacity, load factor, and hasher.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// An empty map with at least `capacity` bucket slots (rounded up to a
    /// power of two; 0 falls back to the default).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }

    /// An empty map with the given starting capacity and load factor.
    pub fn with_load_factor(capacity: usize, load_factor: f64) -> Result<Self, ConfigError> {
        Self::with_options(capacity, load_factor, RandomState::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_options(capacity, DEFAULT_LOAD_FACTOR, hasher)
            .expect("default load factor is valid")
    }

    /// The fully parameterized constructor; the others delegate here.
    pub fn with_options(capacity: usize, load_factor: f64, hasher: S) -> Result<Self, ConfigError> {
        // One comparison rejects zero, negatives, and NaN.
        if !(load_factor > 0.0) {
            return Err(ConfigError::InvalidLoadFactor(load_factor));
        }
        let len = initial_table_len(capacity);
        Ok(Self {
            hasher,
            table: vec![None; len],
            nodes: SlotMap::with_key(),
            load_factor,
            threshold: grow_threshold(len, load_factor),
            reentry: ReentryCheck::new(),
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Current bucket-slot count. Always a power of two.
    pub fn capacity(&self) -> usize {
        self.table.len()
    }
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    fn spread_key<Q>(&self, key: Option<&Q>) -> u64
    where
        Q: ?Sized + Hash,
    {
        match key {
            // The null key lands in bucket 0 of any table.
            None => 0,
            Some(q) => spread(self.hasher.hash_one(q)),
        }
    }

    /// Walks one bucket's chain for a key, comparing cached hashes before
    /// falling back to `Eq`.
    fn find_node<Q>(&self, bucket: usize, hash: u64, key: Option<&Q>) -> Option<DefaultKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.table[bucket];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            debug_assert_eq!(index_for(node.hash, self.table.len()), bucket);
            if node.hash == hash && node.key.as_ref().map(|stored| stored.borrow()) == key {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    /// Looks up a value. `None` as the key queries the null key; `None` as
    /// the result means the key is absent.
    pub fn get<Q>(&self, key: Option<&Q>) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.enter();
        if self.nodes.is_empty() {
            return None;
        }
        let hash = self.spread_key(key);
        let bucket = index_for(hash, self.table.len());
        let k = self.find_node(bucket, hash, key)?;
        Some(&self.nodes[k].value)
    }

    /// Looks up the live view of a key's entry.
    pub fn find<Q>(&self, key: Option<&Q>) -> Option<EntryRef>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.enter();
        if self.nodes.is_empty() {
            return None;
        }
        let hash = self.spread_key(key);
        let bucket = index_for(hash, self.table.len());
        self.find_node(bucket, hash, key).map(EntryRef::new)
    }

    pub fn contains_key<Q>(&self, key: Option<&Q>) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Inserts or overwrites. Returns the previous value when the key was
    /// already present, `None` for a fresh key.
    ///
    /// A fresh entry is linked at the head of its bucket's chain; an
    /// overwrite touches only the stored value (no relink, no growth
    /// check).
    pub fn insert(&mut self, key: Option<K>, value: V) -> Option<V> {
        let _g = self.reentry.enter();
        let hash = self.spread_key(key.as_ref());
        let bucket = index_for(hash, self.table.len());
        if let Some(k) = self.find_node(bucket, hash, key.as_ref()) {
            return Some(mem::replace(&mut self.nodes[k].value, value));
        }
        let node = Node {
            hash,
            key,
            value,
            next: self.table[bucket],
        };
        let k = self.nodes.insert(node);
        self.table[bucket] = Some(k);
        if self.nodes.len() > self.threshold {
            // End this guard so `resize` (a `&mut self` call) can open its
            // own guarded section; no user code runs in between.
            drop(_g);
            self.resize();
        }
        None
    }

    /// Removes a key's entry and returns its value, or `None` if absent
    /// (removing an absent key has no effect). Any `EntryRef` to the entry
    /// goes stale.
    pub fn remove<Q>(&mut self, key: Option<&Q>) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        // The node is returned out of the critical section before being
        // taken apart, so `Drop` for K or V may call back into the map.
        let node = self.unlink_node(key)?;
        Some(node.value)
    }

    fn unlink_node<Q>(&mut self, key: Option<&Q>) -> Option<Node<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.enter();
        if self.nodes.is_empty() {
            return None;
        }
        let hash = self.spread_key(key);
        let bucket = index_for(hash, self.table.len());
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.table[bucket];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            let next = node.next;
            if node.hash == hash && node.key.as_ref().map(|stored| stored.borrow()) == key {
                match prev {
                    // Chain head: the bucket takes over the tail.
                    None => self.table[bucket] = next,
                    Some(p) => self.nodes[p].next = next,
                }
                return Some(self.nodes.remove(k).expect("unlinked node must be live"));
            }
            prev = Some(k);
            cur = next;
        }
        None
    }

    /// Grows (or, with a small load factor, shrinks) the table to twice the
    /// live entry count, rounded up to a power of two. Every node is
    /// rehashed from its key and relinked at the head of its new bucket,
    /// with the cached hash refreshed. Entry handles survive: nodes move
    /// between chains, never between slots.
    fn resize(&mut self) {
        let _g = self.reentry.enter();
        let new_len = grown_table_len(self.nodes.len());
        let old = mem::replace(&mut self.table, vec![None; new_len]);
        for head in old {
            let mut cur = head;
            while let Some(k) = cur {
                let next = self.nodes[k].next;
                let hash = match self.nodes[k].key.as_ref() {
                    None => 0,
                    Some(key) => spread(self.hasher.hash_one(key)),
                };
                let bucket = index_for(hash, new_len);
                let prev_head = self.table[bucket];
                let node = &mut self.nodes[k];
                node.hash = hash;
                node.next = prev_head;
                self.table[bucket] = Some(k);
                cur = next;
            }
        }
        self.threshold = grow_threshold(new_len, self.load_factor);
    }

    pub(crate) fn entry_key(&self, r: EntryRef) -> Option<Option<&K>> {
        let _g = self.reentry.enter();
        self.nodes.get(r.raw()).map(|node| node.key.as_ref())
    }

    pub(crate) fn entry_value(&self, r: EntryRef) -> Option<&V> {
        let _g = self.reentry.enter();
        self.nodes.get(r.raw()).map(|node| &node.value)
    }

    pub(crate) fn entry_value_mut(&mut self, r: EntryRef) -> Option<&mut V> {
        let _g = self.reentry.enter();
        self.nodes.get_mut(r.raw()).map(|node| &mut node.value)
    }

    pub(crate) fn entry_set_value(&mut self, r: EntryRef, value: V) -> Option<V> {
        let _g = self.reentry.enter();
        self.nodes
            .get_mut(r.raw())
            .map(|node| mem::replace(&mut node.value, value))
    }

    fn chain_walk(&self) -> ChainWalk<'_, K, V> {
        ChainWalk {
            table: &self.table,
            nodes: &self.nodes,
            bucket: 0,
            cur: None,
        }
    }

    /// Every value, in bucket-then-chain order. Duplicates allowed.
    pub fn values(&self) -> Vec<&V> {
        self.chain_walk().map(|(_, node)| &node.value).collect()
    }

    /// Every key (`None` is the null key). No duplicates; length equals
    /// `len()`.
    pub fn keys(&self) -> Vec<Option<&K>> {
        self.chain_walk().map(|(_, node)| node.key.as_ref()).collect()
    }

    /// A live view per entry; length equals `len()`. Mutating a value
    /// through a returned [`EntryRef`] writes through to the map.
    pub fn entries(&self) -> Vec<EntryRef> {
        self.chain_walk().map(|(k, _)| EntryRef::new(k)).collect()
    }

    /// Iterates entries in storage order as `(handle, key, &value)`.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.nodes.iter(),
        }
    }

    /// Iterates entries with mutable value access, for bulk updates
    /// without re-inserting.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.nodes.iter_mut(),
        }
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.nodes.values().map(|node| (&node.key, &node.value)))
            .finish()
    }
}

/// Cursor visiting every bucket and every chain node exactly once.
struct ChainWalk<'a, K, V> {
    table: &'a [Option<DefaultKey>],
    nodes: &'a SlotMap<DefaultKey, Node<K, V>>,
    bucket: usize,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for ChainWalk<'a, K, V> {
    type Item = (DefaultKey, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(k) = self.cur {
                let node = self.nodes.get(k).expect("chained node must be live");
                self.cur = node.next;
                return Some((k, node));
            }
            let head = *self.table.get(self.bucket)?;
            self.bucket += 1;
            self.cur = head;
        }
    }
}

/// Iterator over immutable entries in a `ChainedHashMap`.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (EntryRef, Option<&'a K>, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, node)| (EntryRef::new(k), node.key.as_ref(), &node.value))
    }
}

/// Iterator over mutable entries in a `ChainedHashMap`.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (EntryRef, Option<&'a K>, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, node)| (EntryRef::new(k), node.key.as_ref(), &mut node.value))
    }
}

/// Starting table length for a requested capacity. A request of 0 falls
/// back to the default; everything else clamps to the ceiling and rounds
/// up to a power of two.
fn initial_table_len(capacity: usize) -> usize {
    let capacity = if capacity < 1 {
        DEFAULT_CAPACITY
    } else {
        capacity.min(MAX_CAPACITY)
    };
    capacity.next_power_of_two()
}

/// Table length after a resize: double the live entry count, not the old
/// capacity, rounded up to a power of two and clamped to the ceiling.
fn grown_table_len(entries: usize) -> usize {
    (entries << 1).next_power_of_two().min(MAX_CAPACITY)
}

/// Entry count above which the table resizes. Pinned to `usize::MAX` at the
/// capacity ceiling so inserts stop attempting table replacement.
fn grow_threshold(table_len: usize, load_factor: f64) -> usize {
    if table_len >= MAX_CAPACITY {
        return usize::MAX;
    }
    (table_len as f64 * load_factor) as usize
}
