use std::collections::VecDeque;
use std::fmt;

/// Newest-first queue that evicts its oldest entry once `capacity` is reached.
/// Without a capacity it grows without bound.
pub struct CircularQueue<T> {
    deque: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T: Clone> Clone for CircularQueue<T> {
    fn clone(&self) -> Self {
        Self {
            deque: self.deque.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CircularQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.deque.fmt(f)
    }
}

impl<T> CircularQueue<T> {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            deque: VecDeque::with_capacity(cap),
            capacity: Some(cap),
        }
    }

    #[inline]
    pub fn unbounded() -> Self {
        Self {
            deque: VecDeque::new(),
            capacity: None,
        }
    }

    #[inline]
    pub fn new(capacity: Option<usize>) -> Self {
        match capacity {
            Some(cap) => Self::with_capacity(cap),
            None => Self::unbounded(),
        }
    }

    /// Pushes `item` as the newest entry, returning the evicted oldest one
    #[inline]
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == Some(0) {
            return Some(item);
        }

        let poped = if self.is_full() {
            self.deque.pop_back()
        } else {
            None
        };

        self.deque.push_front(item);

        poped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self.capacity, Some(cap) if self.deque.len() >= cap)
    }

    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Newest first
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'_ T> {
        self.deque.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::CircularQueue;

    #[test]
    fn evicts_oldest_when_full() {
        let mut q = CircularQueue::with_capacity(2);

        assert_eq!(q.push(1), None);
        assert_eq!(q.push(2), None);
        assert_eq!(q.push(3), Some(1));
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(q.len(), 2);
        assert!(q.is_full());
    }

    #[test]
    fn unbounded_never_evicts() {
        let mut q = CircularQueue::unbounded();

        for i in 0..1000 {
            assert_eq!(q.push(i), None);
        }

        assert_eq!(q.len(), 1000);
        assert!(!q.is_full());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut q = CircularQueue::with_capacity(0);

        assert_eq!(q.push(7), Some(7));
        assert!(q.is_empty());
    }
}
