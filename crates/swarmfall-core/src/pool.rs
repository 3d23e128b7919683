//! Generic bounded object pool.
//!
//! [`ObjectPool`] pre-builds a number of items, hands out free ones, grows in
//! fixed steps when it runs dry, and stops at a hard cap. Once the cap is
//! reached `acquire` returns `None` and logs a warning; it never panics and
//! never allocates past the cap.
//!
//! # Architecture
//!
//! Items live in a dense `Vec` addressed by [`PoolHandle`]. A parallel flag
//! vector marks which slots are handed out and a stack holds the free slot
//! indices, so acquire and release are O(1) and the active and available
//! partitions are always disjoint.
//!
//! Construction and reset are supplied by a [`Recycle`] implementation, not
//! by the pool, so one pool type serves plain values and pooled entities
//! alike. `Env` is whatever the recycler needs to touch (the world, for
//! entity pools).
//!
//! # Example
//!
//! ```
//! use swarmfall_core::config::PoolConfig;
//! use swarmfall_core::pool::{ObjectPool, Recycle};
//!
//! struct Buffers;
//!
//! impl Recycle for Buffers {
//!     type Item = Vec<u8>;
//!     type Env = ();
//!     type Args = usize;
//!
//!     fn create(&mut self, _env: &mut ()) -> Vec<u8> {
//!         Vec::with_capacity(64)
//!     }
//!
//!     fn reset(&mut self, item: &mut Vec<u8>, _env: &mut (), len: usize) {
//!         item.clear();
//!         item.resize(len, 0);
//!     }
//! }
//!
//! let mut pool = ObjectPool::new(Buffers, PoolConfig { initial: 2, max: 3, growth: 1 }, &mut ());
//! let a = pool.acquire(&mut (), 8).unwrap();
//! let b = pool.acquire(&mut (), 8).unwrap();
//! let c = pool.acquire(&mut (), 8).unwrap();
//! assert!(pool.acquire(&mut (), 8).is_none());
//!
//! pool.release(a, &mut ());
//! assert_eq!(pool.active_count() + pool.available_count(), pool.total_count());
//! # let _ = (b, c);
//! ```

use std::fmt;

use crate::config::PoolConfig;

/// Index of an item inside an [`ObjectPool`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolHandle(u32);

impl PoolHandle {
    // Pools never hold more than `u32::MAX` items.
    #[allow(clippy::cast_possible_truncation)]
    const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolHandle({})", self.0)
    }
}

/// Construction and reset logic for pooled items.
pub trait Recycle {
    /// Pooled value.
    type Item;
    /// State the recycler touches while building or resetting items.
    type Env: ?Sized;
    /// Live parameters applied on every acquire.
    type Args;

    /// Builds a fresh, inactive item.
    fn create(&mut self, env: &mut Self::Env) -> Self::Item;

    /// Prepares `item` for use with `args`.
    fn reset(&mut self, item: &mut Self::Item, env: &mut Self::Env, args: Self::Args);

    /// Parks `item` after release.
    fn retire(&mut self, _item: &mut Self::Item, _env: &mut Self::Env) {}

    /// Frees `item` at teardown.
    fn destroy(&mut self, _item: Self::Item, _env: &mut Self::Env) {}
}

/// Bounded reuse allocator over a [`Recycle`] implementation.
///
/// `active_count() + available_count() == total_count() <= max` holds after
/// every operation.
pub struct ObjectPool<R: Recycle> {
    recycler: R,
    items: Vec<R::Item>,
    in_use: Vec<bool>,
    available: Vec<u32>,
    active: usize,
    growth: usize,
    max: usize,
}

impl<R: Recycle> ObjectPool<R> {
    /// Builds the pool and pre-warms `config.initial` items (clamped to
    /// `config.max`).
    pub fn new(recycler: R, config: PoolConfig, env: &mut R::Env) -> Self {
        let max = config.max.min(u32::MAX as usize);
        let mut pool = Self {
            recycler,
            items: Vec::with_capacity(config.initial.min(max)),
            in_use: Vec::with_capacity(config.initial.min(max)),
            available: Vec::with_capacity(config.initial.min(max)),
            active: 0,
            growth: config.growth.max(1),
            max,
        };
        pool.grow(config.initial, env);
        pool
    }

    /// Builds up to `count` more items, stopping at the cap. Returns how many
    /// were built.
    pub fn grow(&mut self, count: usize, env: &mut R::Env) -> usize {
        let count = count.min(self.max - self.items.len());
        for _ in 0..count {
            let index = self.items.len();
            self.items.push(self.recycler.create(env));
            self.in_use.push(false);
            self.available.push(PoolHandle::from_index(index).0);
        }
        count
    }

    /// Hands out a free item reset with `args`.
    ///
    /// Grows by the configured step when no item is free. Returns `None`, with
    /// a warning, once the cap is reached.
    pub fn acquire(&mut self, env: &mut R::Env, args: R::Args) -> Option<PoolHandle> {
        if self.available.is_empty() && self.grow(self.growth, env) == 0 {
            tracing::warn!(
                total = self.items.len(),
                max = self.max,
                item = std::any::type_name::<R::Item>(),
                "object pool exhausted"
            );
            return None;
        }
        let index = self.available.pop()?;
        let slot = index as usize;
        self.in_use[slot] = true;
        self.active += 1;
        self.recycler.reset(&mut self.items[slot], env, args);
        Some(PoolHandle(index))
    }

    /// Returns `handle` to the free set.
    ///
    /// Releasing an item that is already free, or a handle this pool never
    /// issued, is a no-op that returns `false`.
    pub fn release(&mut self, handle: PoolHandle, env: &mut R::Env) -> bool {
        let slot = handle.index();
        match self.in_use.get_mut(slot) {
            Some(in_use) if *in_use => *in_use = false,
            _ => return false,
        }
        self.active -= 1;
        self.available.push(handle.0);
        self.recycler.retire(&mut self.items[slot], env);
        true
    }

    /// Releases every active item. Returns how many were released.
    pub fn release_all(&mut self, env: &mut R::Env) -> usize {
        let mut released = 0;
        for index in 0..self.items.len() {
            if self.release(PoolHandle::from_index(index), env) {
                released += 1;
            }
        }
        released
    }

    /// Frees every item through [`Recycle::destroy`] and empties the pool.
    pub fn teardown(&mut self, env: &mut R::Env) {
        for item in self.items.drain(..) {
            self.recycler.destroy(item, env);
        }
        self.in_use.clear();
        self.available.clear();
        self.active = 0;
    }

    /// The item behind `handle`, whether active or not.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&R::Item> {
        self.items.get(handle.index())
    }

    /// The item behind `handle`, mutably.
    #[must_use]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut R::Item> {
        self.items.get_mut(handle.index())
    }

    /// Returns `true` if `handle` is currently handed out.
    #[must_use]
    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.in_use.get(handle.index()).copied().unwrap_or(false)
    }

    /// Handles of every active item, in slot order.
    pub fn active_handles(&self) -> impl Iterator<Item = PoolHandle> + '_ {
        self.in_use
            .iter()
            .enumerate()
            .filter(|(_, in_use)| **in_use)
            .map(|(index, _)| PoolHandle::from_index(index))
    }

    /// Every item paired with its handle, in slot order.
    pub fn items(&self) -> impl Iterator<Item = (PoolHandle, &R::Item)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (PoolHandle::from_index(index), item))
    }

    /// Items currently handed out.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.active
    }

    /// Items ready to hand out without growing.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Items built so far.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    /// Hard cap on items.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// The recycler.
    #[must_use]
    pub const fn recycler(&self) -> &R {
        &self.recycler
    }
}

impl<R: Recycle> fmt::Debug for ObjectPool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("active", &self.active)
            .field("available", &self.available.len())
            .field("total", &self.items.len())
            .field("max", &self.max)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Counts lifecycle calls through the environment.
    #[derive(Default)]
    struct Counters {
        created: usize,
        reset: usize,
        retired: usize,
        destroyed: usize,
    }

    struct Counting;

    impl Recycle for Counting {
        type Item = u32;
        type Env = Counters;
        type Args = u32;

        fn create(&mut self, env: &mut Counters) -> u32 {
            env.created += 1;
            0
        }

        fn reset(&mut self, item: &mut u32, env: &mut Counters, value: u32) {
            env.reset += 1;
            *item = value;
        }

        fn retire(&mut self, item: &mut u32, env: &mut Counters) {
            env.retired += 1;
            *item = 0;
        }

        fn destroy(&mut self, _item: u32, env: &mut Counters) {
            env.destroyed += 1;
        }
    }

    fn pool(initial: usize, max: usize, growth: usize) -> (ObjectPool<Counting>, Counters) {
        let mut env = Counters::default();
        let pool = ObjectPool::new(Counting, PoolConfig { initial, max, growth }, &mut env);
        (pool, env)
    }

    fn assert_partition(pool: &ObjectPool<Counting>) {
        assert_eq!(
            pool.active_count() + pool.available_count(),
            pool.total_count()
        );
        assert!(pool.total_count() <= pool.max());
        assert_eq!(pool.active_handles().count(), pool.active_count());
    }

    mod acquire_tests {
        use super::*;

        #[test]
        fn prewarms_initial_items() {
            let (pool, env) = pool(5, 10, 2);
            assert_eq!(env.created, 5);
            assert_eq!(pool.available_count(), 5);
            assert_eq!(pool.active_count(), 0);
        }

        #[test]
        fn prewarm_is_clamped_to_max() {
            let (pool, _) = pool(50, 10, 2);
            assert_eq!(pool.total_count(), 10);
        }

        #[test]
        fn acquire_resets_with_args() {
            let (mut pool, mut env) = pool(1, 1, 1);
            let handle = pool.acquire(&mut env, 42).unwrap();
            assert_eq!(pool.get(handle), Some(&42));
            assert!(pool.is_active(handle));
            assert_eq!(env.reset, 1);
        }

        #[test]
        fn grows_in_steps_up_to_cap() {
            let (mut pool, mut env) = pool(2, 5, 2);
            for _ in 0..3 {
                pool.acquire(&mut env, 1).unwrap();
            }
            assert_eq!(pool.total_count(), 4);
            for _ in 0..2 {
                pool.acquire(&mut env, 1).unwrap();
            }
            assert_eq!(pool.total_count(), 5);
            assert!(pool.acquire(&mut env, 1).is_none());
            assert_eq!(env.created, 5);
            assert_partition(&pool);
        }

        #[test]
        fn zero_cap_pool_is_always_exhausted() {
            let (mut pool, mut env) = pool(0, 0, 4);
            assert!(pool.acquire(&mut env, 1).is_none());
            assert_eq!(pool.total_count(), 0);
        }
    }

    mod release_tests {
        use super::*;

        #[test]
        fn release_returns_item_to_free_set() {
            let (mut pool, mut env) = pool(1, 1, 1);
            let handle = pool.acquire(&mut env, 9).unwrap();
            assert!(pool.release(handle, &mut env));
            assert!(!pool.is_active(handle));
            assert_eq!(pool.get(handle), Some(&0));
            assert_eq!(env.retired, 1);
            assert!(pool.acquire(&mut env, 3).is_some());
        }

        #[test]
        fn double_release_is_a_no_op() {
            let (mut pool, mut env) = pool(2, 2, 1);
            let handle = pool.acquire(&mut env, 9).unwrap();
            assert!(pool.release(handle, &mut env));
            assert!(!pool.release(handle, &mut env));
            assert_eq!(pool.available_count(), 2);
            assert_eq!(env.retired, 1);
            assert_partition(&pool);
        }

        #[test]
        fn foreign_handle_is_a_no_op() {
            let (mut pool, mut env) = pool(1, 1, 1);
            assert!(!pool.release(PoolHandle(7), &mut env));
            assert_partition(&pool);
        }

        #[test]
        fn release_all_frees_everything() {
            let (mut pool, mut env) = pool(4, 4, 1);
            for value in 0..4 {
                pool.acquire(&mut env, value).unwrap();
            }
            assert_eq!(pool.release_all(&mut env), 4);
            assert_eq!(pool.active_count(), 0);
            assert_eq!(pool.available_count(), 4);
        }

        #[test]
        fn teardown_destroys_every_item() {
            let (mut pool, mut env) = pool(3, 6, 3);
            pool.acquire(&mut env, 1).unwrap();
            pool.teardown(&mut env);
            assert_eq!(env.destroyed, 3);
            assert_eq!(pool.total_count(), 0);
            assert_partition(&pool);
        }
    }

    proptest! {
        #[test]
        fn partition_holds_for_any_sequence(
            initial in 0usize..8,
            max in 0usize..16,
            growth in 1usize..5,
            ops in prop::collection::vec((any::<bool>(), 0usize..16), 0..128),
        ) {
            let (mut pool, mut env) = pool(initial, max, growth);
            let mut handles: Vec<PoolHandle> = Vec::new();
            for (is_acquire, pick) in ops {
                if is_acquire {
                    match pool.acquire(&mut env, 1) {
                        Some(handle) => handles.push(handle),
                        None => prop_assert_eq!(pool.total_count(), pool.max()),
                    }
                } else if !handles.is_empty() {
                    // Duplicate handles may be released twice on purpose.
                    let handle = handles[pick % handles.len()];
                    pool.release(handle, &mut env);
                }
                prop_assert_eq!(
                    pool.active_count() + pool.available_count(),
                    pool.total_count()
                );
                prop_assert!(pool.total_count() <= pool.max().max(initial.min(max)));
            }
        }
    }
}
