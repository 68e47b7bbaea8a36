use std::cell::Cell;
use std::rc::Rc;

/// Re-entrant modification lock
///
/// Held while condition policies run; statements may not be applied while
/// the count is above zero. Guards release on drop, so every exit path of
/// the guarded region lowers the count.
#[derive(Debug, Clone, Default)]
pub(crate) struct StateLock(Rc<Cell<u32>>);

impl StateLock {
    pub(crate) fn acquire(&self) -> LockGuard {
        self.0.set(self.0.get() + 1);
        LockGuard(Rc::clone(&self.0))
    }

    pub(crate) fn is_held(&self) -> bool {
        self.0.get() > 0
    }
}

#[must_use = "the lock is released when the guard is dropped"]
pub(crate) struct LockGuard(Rc<Cell<u32>>);

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
