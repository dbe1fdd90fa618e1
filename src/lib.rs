//! chained-hashmap: a separate-chaining hash map built from first
//! principles, with live entry handles.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: implement the classic bucket-array hash table directly (no
//!   delegation to `std::collections::HashMap` or `hashbrown`) in small,
//!   separately testable layers.
//! - Layers:
//!   - hash: the spread transform (XOR folds of right shifts 20/12/7/4)
//!     and power-of-two mask indexing. Pure functions.
//!   - map: `ChainedHashMap<K, V, S>`. A `Vec` of bucket slots where each
//!     slot heads a singly linked chain, nodes stored in a slotmap arena
//!     and linked by arena key. `EntryRef` wraps the arena key as a
//!     copyable live view of one entry.
//!   - reentry: debug-only check that panics when user code re-enters the
//!     map while an operation is in flight.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` by design, enforced with a marker
//!   type; no operation suspends.
//! - The table length is always a power of two. Indexing is `hash & (len
//!   - 1)`; this is a correctness invariant, not an optimization.
//! - Exactly one null-keyed entry may exist. The API models it as
//!   `Option`: `insert(None, v)` writes the null key, which always hashes
//!   to 0 and so lives in bucket 0.
//! - `len()` counts live entries and is tracked by the arena itself, so
//!   it cannot drift from the stored nodes.
//!
//! Resize policy
//! - Inserting past `floor(capacity * load_factor)` rebuilds the table at
//!   twice the live entry count (not twice the old capacity), rounded up
//!   to a power of two. With load factors below one half this can shrink
//!   a sparse table; that is intended.
//! - Nodes are rehashed from their keys and relinked head-first into the
//!   new buckets, with cached hashes refreshed. Nodes never change arena
//!   slots, so every outstanding `EntryRef` survives a resize.
//! - At the capacity ceiling (2^30 slots) the threshold pins to
//!   `usize::MAX` and the table stops being replaced.
//!
//! Reentrancy policy and interior mutability
//! - Operations that can run user code (`K: Hash`/`K: Eq` during probes
//!   and resize) open a debug-only guarded section; re-entering the map
//!   from that user code panics in debug builds. Release builds compile
//!   the check away.
//! - Removed keys and values are dropped (or handed to the caller) only
//!   after the guarded section ends, so `Drop` implementations may call
//!   back into the map.
//!
//! Hasher and rehashing invariants
//! - Each entry caches its post-spread hash; probes compare the cached
//!   hash before calling `K: Eq`. A resize recomputes every hash from the
//!   key, so hashing must be deterministic for the lifetime of the map
//!   (true of `BuildHasher` implementations, whose per-instance seed is
//!   fixed at construction).
//!
//! Notes and non-goals
//! - Iteration order is unspecified.
//! - No adversarial hash-flooding resistance beyond what the chosen
//!   `BuildHasher` provides.
//! - No concurrency, no persistence, no `clear()`/`drain()`, no entry
//!   API; `EntryRef` plus `iter_mut` cover in-place mutation.
//! - A handle used with a map other than its origin is memory-safe
//!   (generational keys) but may resolve to an unrelated entry; handles
//!   are meaningful only with the map that produced them.

mod hash;
mod map;
mod map_proptest;
mod reentry;

// Public surface
pub use map::{
    ChainedHashMap, ConfigError, EntryRef, Iter, IterMut, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR,
    MAX_CAPACITY,
};
