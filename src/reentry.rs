//! Debug-only reentrancy check.
//!
//! The map runs user code (`Hash`/`Eq`) while its buckets and chains may be
//! mid-update. If that user code calls back into the same map, the walk could
//! observe a half-linked chain. In debug builds entering an operation while
//! another is in flight panics; in release builds everything here compiles
//! away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Embedded in the map; each public operation opens with
/// `let _g = self.reentry.enter();`.
pub(crate) struct ReentryCheck {
    #[cfg(debug_assertions)]
    entered: Cell<bool>,
    // The check is not thread-aware, so keep the owner !Send + !Sync.
    _single_thread: PhantomData<*mut ()>,
}

impl ReentryCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            entered: Cell::new(false),
            _single_thread: PhantomData,
        }
    }

    /// Opens a critical section, closed when the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self) -> ReentryGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.entered.replace(true),
                "map re-entered while an operation is in flight"
            );
            return ReentryGuard { check: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentryGuard { _lt: PhantomData };
        }
    }
}

/// RAII guard returned by [`ReentryCheck::enter`].
pub(crate) struct ReentryGuard<'a> {
    #[cfg(debug_assertions)]
    check: &'a ReentryCheck,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentryGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.check.entered.set(false);
    }
}
