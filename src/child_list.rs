//! Pooled child lists.
//!
//! Leaf elements never allocate: their children point at one shared, empty
//! sentinel. The first insertion swaps in a buffer taken from the pool and the
//! last removal hands it back.

use crate::tree::ElementId;

static EMPTY: [ElementId; 0] = [];

#[derive(Debug, Default)]
pub enum ChildList {
    /// The shared empty sentinel.
    #[default]
    Shared,
    Owned(Vec<ElementId>),
}

impl ChildList {
    pub fn as_slice(&self) -> &[ElementId] {
        match self {
            ChildList::Shared => &EMPTY,
            ChildList::Owned(list) => list,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, ChildList::Shared)
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.as_slice().iter().position(|&c| c == id)
    }

    pub fn get(&self, index: usize) -> Option<ElementId> {
        self.as_slice().get(index).copied()
    }

    /// Mutable access to the owned buffer. `None` for the shared sentinel.
    pub fn owned_mut(&mut self) -> Option<&mut Vec<ElementId>> {
        match self {
            ChildList::Shared => None,
            ChildList::Owned(list) => Some(list),
        }
    }
}

/// Free-list of child buffers.
#[derive(Debug, Default)]
pub struct ChildListPool {
    free: Vec<Vec<ElementId>>,
    acquired: usize,
}

impl ChildListPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sentinel with a pooled buffer. No-op if already owned.
    pub fn materialize(&mut self, list: &mut ChildList) {
        if list.is_shared() {
            self.acquired += 1;
            *list = ChildList::Owned(self.free.pop().unwrap_or_default());
        }
    }

    /// Return the buffer to the pool and reinstall the sentinel.
    pub fn release(&mut self, list: &mut ChildList) {
        if let ChildList::Owned(mut buffer) = std::mem::take(list) {
            buffer.clear();
            self.acquired = self.acquired.saturating_sub(1);
            self.free.push(buffer);
        }
    }

    /// Pooled copy of `ids`, for callers that need a snapshot.
    pub fn copy(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut buffer = self.free.pop().unwrap_or_default();
        buffer.extend_from_slice(ids);
        buffer
    }

    /// Give back a buffer obtained from [`ChildListPool::copy`].
    pub fn recycle(&mut self, mut buffer: Vec<ElementId>) {
        buffer.clear();
        self.free.push(buffer);
    }

    /// Number of buffers currently held by elements.
    pub fn in_use(&self) -> usize {
        self.acquired
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_sentinel_is_empty() {
        let list = ChildList::default();
        assert!(list.is_shared());
        assert!(list.is_empty());
        assert_eq!(list.as_slice().as_ptr(), ChildList::Shared.as_slice().as_ptr());
    }

    #[test]
    fn test_materialize_and_release_recycles_buffer() {
        let mut pool = ChildListPool::new();
        let mut list = ChildList::default();

        pool.materialize(&mut list);
        assert!(!list.is_shared());
        assert_eq!(pool.in_use(), 1);

        if let Some(buffer) = list.owned_mut() {
            buffer.reserve(32);
        }
        pool.release(&mut list);
        assert!(list.is_shared());
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.available(), 1);

        let mut other = ChildList::default();
        pool.materialize(&mut other);
        assert_eq!(pool.available(), 0);
        assert!(other.owned_mut().is_some_and(|b| b.capacity() >= 32));
    }

    #[test]
    fn test_release_of_shared_is_noop() {
        let mut pool = ChildListPool::new();
        let mut list = ChildList::default();
        pool.release(&mut list);
        assert_eq!(pool.available(), 0);
    }
}
