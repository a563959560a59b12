//! Fixed-capacity FIFO of recent raw points.

use std::collections::VecDeque;

use gazetile_model::point::RawPoint;

/// How many raw points a tracking session retains by default.
pub const DEFAULT_CAPACITY: usize = 200;

/// Bounded FIFO. Appends at the tail and evicts from the head once full,
/// so iteration is always oldest-first.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

/// The buffer a tracking session feeds calibration from.
pub type RawPointBuffer = RingBuffer<RawPoint>;

impl<T> RingBuffer<T> {
    /// Create a buffer holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest if the buffer is full.
    /// Returns the evicted item, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// The most recent `count` items, oldest first. Fewer if the buffer
    /// holds fewer.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &T> + '_ {
        let skip = self.items.len().saturating_sub(count);
        self.items.iter().skip(skip)
    }

    /// All items, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for RawPointBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
