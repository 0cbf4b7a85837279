//! Scoped restore of per-request render state.

use std::ops::{Deref, DerefMut};

/// Mutable access to a value that runs `restore` on it when dropped.
///
/// Depth counters and the content-callback slot are reset through this, so
/// they come back on early returns and during unwinding alike.
pub(crate) struct Restore<'v, T, F>
where
    F: FnOnce(&mut T),
{
    value: &'v mut T,
    restore: Option<F>,
}

impl<'v, T, F> Restore<'v, T, F>
where
    F: FnOnce(&mut T),
{
    pub(crate) fn new(value: &'v mut T, restore: F) -> Self {
        Self {
            value,
            restore: Some(restore),
        }
    }
}

impl<T, F> Deref for Restore<'_, T, F>
where
    F: FnOnce(&mut T),
{
    type Target = T;

    fn deref(&self) -> &T {
        self.value
    }
}

impl<T, F> DerefMut for Restore<'_, T, F>
where
    F: FnOnce(&mut T),
{
    fn deref_mut(&mut self) -> &mut T {
        self.value
    }
}

impl<T, F> Drop for Restore<'_, T, F>
where
    F: FnOnce(&mut T),
{
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore(self.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;

    #[test]
    fn restores_on_normal_exit() {
        let mut depth = 1;
        {
            let mut guard = Restore::new(&mut depth, |d: &mut i32| *d -= 1);
            *guard += 1;
            assert_eq!(*guard, 2);
        }
        assert_eq!(depth, 1);
    }

    #[test]
    fn restores_during_unwind() {
        let mut slot = Some("outer");
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let saved = slot.replace("inner");
            let _guard = Restore::new(&mut slot, move |s: &mut Option<&str>| *s = saved);
            panic!("template failed");
        }));
        assert!(result.is_err());
        assert_eq!(slot, Some("outer"));
    }
}
