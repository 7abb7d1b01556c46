//! Fixed capacity ring buffer backing the blocking queue.
//!
//! Not synchronized on its own: every method expects the caller to hold
//! the queue lock.

/// `Ring` stores at most `capacity` elements in a contiguous slice.
///
/// `head` points at the next slot to dequeue, `tail` at the next slot to
/// enqueue, both wrap modulo the capacity. Vacant slots hold `None`, an
/// element slot is never `None`.
pub(crate) struct Ring<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> Ring<T> {
    /// Capacity must be non-zero, the queue validates it first.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        let slots: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }

    /// Writes `item` at `tail`. Hands the item back when full so the
    /// caller never loses it.
    pub(crate) fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }

        debug_assert!(self.slots[self.tail].is_none());
        self.slots[self.tail] = Some(item);
        self.tail = self.advance(self.tail);
        self.count += 1;
        Ok(())
    }

    /// Removes the element at `head`.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let item = self.slots[self.head].take();
        debug_assert!(item.is_some());
        self.head = self.advance(self.head);
        self.count -= 1;
        item
    }

    pub(crate) fn front(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.slots[self.head].as_ref()
    }

    /// Drops every stored element and rewinds both indices.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.count;
        while self.pop().is_some() {}
        self.head = 0;
        self.tail = 0;
        dropped
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("count", &self.count)
            .finish()
    }
}
