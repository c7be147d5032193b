//! Fixed-capacity circular history container.
//!
//! Items live in a fixed slot array addressed by a head index and an
//! occupied count. Pushing into a full buffer overwrites the oldest item.
//!
//! ```text
//!   slots = [d, b, c]   head = 1, len = 3
//!   oldest -> newest:  b, c, d
//!   next push writes slots[(head + len) % cap] = slots[1] and moves head
//! ```
//!
//! Resizing rebuilds the slot array and keeps the most recent items, so it
//! is an administrative operation rather than a hot path.

use std::num::NonZeroUsize;

use crate::error::{Result, StoreError};

/// Fixed-capacity FIFO that evicts its oldest item when full.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. Fails if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::with_capacity)
            .ok_or_else(|| StoreError::zero_capacity("capacity"))
    }

    /// Create an empty buffer from an already validated capacity.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Self::empty_slots(capacity.get()),
            head: 0,
            len: 0,
        }
    }

    fn empty_slots(capacity: usize) -> Vec<Option<T>> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        slots
    }

    /// Append an item, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, value: T) {
        let cap = self.capacity();
        let idx = (self.head + self.len) % cap;
        self.slots[idx] = Some(value);
        if self.len < cap {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % cap;
        }
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the buffer holds no items
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of items kept
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterate oldest -> newest without copying.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let cap = self.capacity();
        (0..self.len).filter_map(move |i| self.slots[(self.head + i) % cap].as_ref())
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        if self.len == 0 {
            return None;
        }
        let idx = (self.head + self.len - 1) % self.capacity();
        self.slots[idx].as_ref()
    }

    /// Drop all items, keeping the capacity.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Change the capacity, keeping the most recent `min(n, len)` items in
    /// their original order. Fails if `n` is zero.
    pub fn set_capacity(&mut self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(StoreError::zero_capacity("capacity"));
        }
        if n == self.capacity() {
            return Ok(());
        }

        let cap = self.capacity();
        let mut items: Vec<T> = Vec::with_capacity(self.len);
        for i in 0..self.len {
            if let Some(v) = self.slots[(self.head + i) % cap].take() {
                items.push(v);
            }
        }
        let skip = items.len().saturating_sub(n);

        self.slots = Self::empty_slots(n);
        self.head = 0;
        self.len = 0;
        for item in items.into_iter().skip(skip) {
            self.push(item);
        }
        Ok(())
    }

    #[cfg(test)]
    fn debug_validate_invariants(&self) {
        assert!(self.len <= self.capacity());
        assert!(self.head < self.capacity());
        assert_eq!(self.slots.iter().filter(|s| s.is_some()).count(), self.len);
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the items out, oldest -> newest.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}
