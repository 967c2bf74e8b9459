//! Object pooling for high-churn entities
//!
//! Pools grow on demand unless a cap is configured. Objects move out of the
//! pool by value, so an acquired object can never also sit in the free list.

use std::fmt;

use thiserror::Error;

/// Objects that can be recycled through an [`EntityPool`]
pub trait Poolable {
    /// Clear transient state when the object returns to the pool
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("pool exhausted: {live} live objects at cap {cap}")]
    Exhausted { live: usize, cap: usize },
}

/// Free-list pool with a factory for misses
pub struct EntityPool<T> {
    free: Vec<T>,
    factory: Box<dyn FnMut() -> T>,
    live: usize,
    created: usize,
    cap: Option<usize>,
}

impl<T> fmt::Debug for EntityPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityPool")
            .field("available", &self.free.len())
            .field("live", &self.live)
            .field("created", &self.created)
            .field("cap", &self.cap)
            .finish()
    }
}

impl<T: Poolable> EntityPool<T> {
    /// Create a pool, pre-warming `initial_size` objects
    pub fn new(initial_size: usize, factory: impl FnMut() -> T + 'static) -> Self {
        let mut pool = Self {
            free: Vec::with_capacity(initial_size),
            factory: Box::new(factory),
            live: 0,
            created: 0,
            cap: None,
        };
        for _ in 0..initial_size {
            let item = (pool.factory)();
            pool.created += 1;
            pool.free.push(item);
        }
        pool
    }

    /// Limit the number of simultaneously live objects
    pub fn with_cap(mut self, cap: Option<usize>) -> Self {
        self.cap = cap;
        self
    }

    /// Take an object, building a new one when the free list is empty
    pub fn get(&mut self) -> Result<T, PoolError> {
        if let Some(cap) = self.cap
            && self.live >= cap
        {
            return Err(PoolError::Exhausted {
                live: self.live,
                cap,
            });
        }
        let item = match self.free.pop() {
            Some(item) => item,
            None => {
                self.created += 1;
                (self.factory)()
            }
        };
        self.live += 1;
        Ok(item)
    }

    /// Reset an object and make it available again
    pub fn return_to_pool(&mut self, mut item: T) {
        item.reset();
        self.live = self.live.saturating_sub(1);
        self.free.push(item);
    }

    /// Objects waiting in the free list
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Objects currently handed out
    pub fn live(&self) -> usize {
        self.live
    }

    /// Total factory invocations
    pub fn created(&self) -> usize {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Widget {
        serial: u32,
        dirty: bool,
        resets: u32,
    }

    impl Poolable for Widget {
        fn reset(&mut self) {
            self.dirty = false;
            self.resets += 1;
        }
    }

    fn counting_pool(initial: usize) -> (EntityPool<Widget>, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let pool = EntityPool::new(initial, move || {
            counter.set(counter.get() + 1);
            Widget {
                serial: counter.get(),
                dirty: false,
                resets: 0,
            }
        });
        (pool, calls)
    }

    #[test]
    fn test_lazy_factory_and_reuse() {
        let (mut pool, calls) = counting_pool(0);
        assert_eq!(calls.get(), 0);

        let mut item = pool.get().unwrap();
        assert_eq!(calls.get(), 1);
        item.dirty = true;
        let serial = item.serial;

        pool.return_to_pool(item);
        let again = pool.get().unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(again.serial, serial);
        assert!(!again.dirty);
        assert_eq!(again.resets, 1);
    }

    #[test]
    fn test_prewarm() {
        let (mut pool, calls) = counting_pool(4);
        assert_eq!(calls.get(), 4);
        assert_eq!(pool.available(), 4);
        let _a = pool.get().unwrap();
        assert_eq!(pool.available(), 3);
        assert_eq!(pool.live(), 1);
        assert_eq!(pool.created(), 4);
    }

    #[test]
    fn test_unbounded_by_default() {
        let (mut pool, _) = counting_pool(0);
        let held: Vec<_> = (0..500).map(|_| pool.get().unwrap()).collect();
        assert_eq!(held.len(), 500);
        assert_eq!(pool.live(), 500);
    }

    #[test]
    fn test_cap_reports_exhaustion() {
        let (pool, _) = counting_pool(0);
        let mut pool = pool.with_cap(Some(2));
        let a = pool.get().unwrap();
        let _b = pool.get().unwrap();
        assert_eq!(pool.get().unwrap_err(), PoolError::Exhausted { live: 2, cap: 2 });
        pool.return_to_pool(a);
        assert!(pool.get().is_ok());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_live_plus_free_matches_created(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
                let (mut pool, _) = counting_pool(0);
                let mut held = Vec::new();
                for acquire in ops {
                    if acquire || held.is_empty() {
                        held.push(pool.get().unwrap());
                    } else if let Some(item) = held.pop() {
                        pool.return_to_pool(item);
                    }
                    prop_assert_eq!(pool.live(), held.len());
                    prop_assert_eq!(pool.live() + pool.available(), pool.created());
                    let mut serials: Vec<u32> = held.iter().map(|p| p.serial).collect();
                    serials.sort_unstable();
                    serials.dedup();
                    prop_assert_eq!(serials.len(), held.len());
                }
            }
        }
    }
}
