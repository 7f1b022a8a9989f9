//! Live-replaceable shared state.
//!
//! Backed by `ArcSwap` so every gate call reads a consistent snapshot without locking,
//! while a reload publishes a new value atomically.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// `Swappable<T>` gives cheap snapshot reads and whole-value replacement.
///
/// Clones observe the same value.
#[derive(Debug)]
pub struct Swappable<T> {
    inner: Arc<ArcSwap<T>>,
}

impl<T> Clone for Swappable<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> Swappable<T> {
    pub fn new(value: T) -> Self {
        Self { inner: Arc::new(ArcSwap::from_pointee(value)) }
    }

    /// Snapshot the current value (cheap clone of Arc).
    pub fn get(&self) -> Arc<T> {
        self.inner.load_full()
    }

    /// Replace the value entirely, returning the previous one.
    pub fn replace(&self, value: T) -> Arc<T> {
        self.inner.swap(Arc::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::Swappable;

    #[test]
    fn snapshots_survive_replacement() {
        let shared = Swappable::new(String::from("v1"));
        let handle = shared.clone();
        let before = shared.get();

        let old = handle.replace(String::from("v2"));

        assert_eq!(*old, "v1");
        assert_eq!(*before, "v1");
        assert_eq!(*shared.get(), "v2");
    }
}
