//! Recency List Module
//!
//! Doubly linked list ordered from most to least recently used. Nodes live
//! in an arena and link to each other by slot index, so every operation is
//! O(1) given a handle and no node owns its neighbours.

// == Handle ==
/// Stable index of a node inside a [`RecencyList`].
///
/// A handle stays valid until its node is removed; the slot may then be
/// reused by a later insertion.
pub type Handle = usize;

#[derive(Debug)]
struct Slot<T> {
    value: T,
    prev: Option<Handle>,
    next: Option<Handle>,
}

// == Recency List ==
/// Tracks access order for LRU eviction.
///
/// - Head = most recently used
/// - Tail = least recently used
#[derive(Debug)]
pub struct RecencyList<T> {
    slots: Vec<Option<Slot<T>>>,
    free: Vec<Handle>,
    head: Option<Handle>,
    tail: Option<Handle>,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Inserts a value as the most recently used node.
    pub fn push_front(&mut self, value: T) -> Handle {
        let slot = Slot {
            value,
            prev: None,
            next: None,
        };
        let handle = match self.free.pop() {
            Some(handle) => {
                self.slots[handle] = Some(slot);
                handle
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.link_front(handle);
        self.len += 1;
        handle
    }

    // == Touch ==
    /// Marks a node as recently used (moves it to the head).
    ///
    /// Returns false if the handle is not live.
    pub fn touch(&mut self, handle: Handle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        if self.head != Some(handle) {
            self.unlink(handle);
            self.link_front(handle);
        }
        true
    }

    // == Remove ==
    /// Removes a node and returns its value.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.is_live(handle) {
            return None;
        }
        self.unlink(handle);
        self.len -= 1;
        self.free.push(handle);
        self.slots[handle].take().map(|slot| slot.value)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used value.
    pub fn pop_back(&mut self) -> Option<T> {
        let tail = self.tail?;
        self.remove(tail)
    }

    // == Accessors ==
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle)
            .and_then(Option::as_ref)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle)
            .and_then(Option::as_mut)
            .map(|slot| &mut slot.value)
    }

    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Iteration ==
    /// Iterates handles and values from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Linking ==
    fn is_live(&self, handle: Handle) -> bool {
        matches!(self.slots.get(handle), Some(Some(_)))
    }

    fn slot_mut(&mut self, handle: Handle) -> &mut Slot<T> {
        // Callers only pass handles checked by is_live or read from links.
        match self.slots[handle].as_mut() {
            Some(slot) => slot,
            None => unreachable!("recency list link points at a free slot"),
        }
    }

    fn link_front(&mut self, handle: Handle) {
        let old_head = self.head;
        {
            let slot = self.slot_mut(handle);
            slot.prev = None;
            slot.next = old_head;
        }
        match old_head {
            Some(head) => self.slot_mut(head).prev = Some(handle),
            None => self.tail = Some(handle),
        }
        self.head = Some(handle);
    }

    fn unlink(&mut self, handle: Handle) {
        let (prev, next) = {
            let slot = self.slot_mut(handle);
            (slot.prev.take(), slot.next.take())
        };
        match prev {
            Some(prev) => self.slot_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slot_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }
}

// == Iterator ==
pub struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: Option<Handle>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let slot = self.list.slots.get(handle)?.as_ref()?;
        self.cursor = slot.next;
        Some((handle, &slot.value))
    }
}
