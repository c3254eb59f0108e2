//! Reader/writer guard around an engine's derived state.

use parking_lot::RwLock;

/// Multi-reader/single-writer wrapper whose guards live exactly as long as
/// the closure passed to [`read`](Self::read) or [`write`](Self::write).
///
/// Guards are released on every exit path, including unwinding out of the
/// closure.
#[derive(Debug, Default)]
pub struct HierarchyLock<T> {
    inner: RwLock<T>,
}

impl<T> HierarchyLock<T> {
    pub fn new(value: T) -> Self {
        Self { inner: RwLock::new(value) }
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Run `f` with exclusive access. The whole mutation happens under one guard.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }
}
