//! Fixed-capacity node pool.
//!
//! A [NodeArena] pre-constructs a bounded number of slots and hands them out
//! through a free list, so that repeatedly tearing down and rebuilding trees
//! does not allocate. Slots are addressed by a global index: the arena's
//! `index_offset` plus the slot position. Two arenas with disjoint offsets
//! therefore produce disjoint index ranges.

use crate::error::{Error, Result};

/// A value that can live in a [NodeArena].
pub trait ArenaSlot: Default {
    /// Called once when the slot is created, with its global index.
    fn assign_index(&mut self, index: usize);

    /// Called when the slot is returned to the arena; must restore a cleared state
    /// while keeping the assigned index.
    fn reset(&mut self);
}

// =#========================================================================#=
// NODE ARENA
// =#========================================================================#=
/// Fixed-capacity pool of slots with O(1) allocate/deallocate.
///
/// # Invariants
/// - Every slot ever created stays in `storage` until the arena is dropped.
/// - A slot is either in `available` or handed out, never both.
/// - Global index of slot `i` is `index_offset + i`.
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    index_offset: usize,
    storage: Vec<T>,
    /// Local positions of free slots; top of stack is allocated next
    available: Vec<usize>,
    in_use: Vec<bool>,
}

impl<T: ArenaSlot> NodeArena<T> {
    /// Creates an arena holding `capacity` slots with indices starting at `index_offset`.
    pub fn new(capacity: usize, index_offset: usize) -> Self {
        let mut arena = NodeArena {
            index_offset,
            storage: Vec::with_capacity(capacity),
            available: Vec::with_capacity(capacity),
            in_use: Vec::with_capacity(capacity),
        };
        arena.reserve(capacity);
        arena
    }

    /// Ensures that at least `total` slots exist, creating any shortfall.
    ///
    /// # Returns
    /// The number of slots added (0 if the arena was already large enough).
    pub fn reserve(&mut self, total: usize) -> usize {
        if total <= self.storage.len() {
            return 0;
        }
        let to_add = total - self.storage.len();
        self.add_storage(to_add);
        log::debug!(
            "Arena at offset {} grown by {} to {} slots",
            self.index_offset,
            to_add,
            self.storage.len()
        );
        to_add
    }

    fn add_storage(&mut self, count: usize) {
        let first = self.storage.len();
        for position in first..first + count {
            let mut slot = T::default();
            slot.assign_index(self.index_offset + position);
            self.storage.push(slot);
            self.in_use.push(false);
        }
        // Lowest index on top, so fresh arenas hand out indices in ascending order
        self.available.extend((first..first + count).rev());
    }

    /// Pops a free slot and returns its global index.
    ///
    /// # Errors
    /// [Error::ArenaExhausted] if every slot is in use. Trees are bounded by
    /// the number of taxa known at session setup, so this is a capacity violation.
    pub fn allocate(&mut self) -> Result<usize> {
        let position = self.available.pop().ok_or(Error::ArenaExhausted {
            capacity: self.storage.len(),
        })?;
        self.in_use[position] = true;
        Ok(self.index_offset + position)
    }

    /// Resets the slot at the given global index and returns it to the free list.
    ///
    /// # Panics
    /// Panics if the index does not belong to this arena or the slot is already free.
    pub fn deallocate(&mut self, index: usize) {
        let position = self.position_of(index);
        assert!(
            self.in_use[position],
            "Slot {index} released twice to arena at offset {}",
            self.index_offset
        );
        self.storage[position].reset();
        self.in_use[position] = false;
        self.available.push(position);
    }
}

impl<T> NodeArena<T> {
    /// Returns whether the global index falls into this arena's range.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.index_offset && index < self.index_offset + self.storage.len()
    }

    /// Returns the total number of slots (free and in use).
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of free slots.
    pub fn num_available(&self) -> usize {
        self.available.len()
    }

    /// Returns the global index of the first slot.
    pub fn index_offset(&self) -> usize {
        self.index_offset
    }

    /// Returns whether the slot at the given global index is currently handed out.
    pub fn is_allocated(&self, index: usize) -> bool {
        self.contains(index) && self.in_use[index - self.index_offset]
    }

    /// Returns the slot at the given global index.
    ///
    /// # Panics
    /// Panics if the index does not belong to this arena.
    pub fn get(&self, index: usize) -> &T {
        &self.storage[self.position_of(index)]
    }

    /// Returns the slot at the given global index mutably.
    ///
    /// # Panics
    /// Panics if the index does not belong to this arena.
    pub fn get_mut(&mut self, index: usize) -> &mut T {
        let position = self.position_of(index);
        &mut self.storage[position]
    }

    fn position_of(&self, index: usize) -> usize {
        assert!(
            self.contains(index),
            "Index {index} outside arena range {}..{}",
            self.index_offset,
            self.index_offset + self.storage.len()
        );
        index - self.index_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug)]
    struct Slot {
        index: usize,
        value: u32,
    }

    impl ArenaSlot for Slot {
        fn assign_index(&mut self, index: usize) {
            self.index = index;
        }

        fn reset(&mut self) {
            self.value = 0;
        }
    }

    #[test]
    fn test_indices_are_offset() {
        let mut arena: NodeArena<Slot> = NodeArena::new(3, 10);
        assert_eq!(arena.allocate().unwrap(), 10);
        assert_eq!(arena.allocate().unwrap(), 11);
        assert_eq!(arena.get(11).index, 11);
        assert!(arena.contains(12));
        assert!(!arena.contains(13));
        assert!(!arena.contains(9));
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let mut arena: NodeArena<Slot> = NodeArena::new(1, 0);
        arena.allocate().unwrap();
        assert!(matches!(
            arena.allocate(),
            Err(Error::ArenaExhausted { capacity: 1 })
        ));
    }

    #[test]
    fn test_deallocate_resets_and_recycles() {
        let mut arena: NodeArena<Slot> = NodeArena::new(2, 0);
        let a = arena.allocate().unwrap();
        arena.get_mut(a).value = 7;
        arena.deallocate(a);
        assert_eq!(arena.get(a).value, 0);
        assert_eq!(arena.get(a).index, a);
        assert_eq!(arena.num_available(), 2);
        assert_eq!(arena.allocate().unwrap(), a);
    }

    #[test]
    fn test_reserve_only_grows() {
        let mut arena: NodeArena<Slot> = NodeArena::new(2, 4);
        assert_eq!(arena.reserve(1), 0);
        assert_eq!(arena.reserve(5), 3);
        assert_eq!(arena.capacity(), 5);
        assert_eq!(arena.get(8).index, 8);
    }

    #[test]
    #[should_panic]
    fn test_double_release_panics() {
        let mut arena: NodeArena<Slot> = NodeArena::new(2, 0);
        let a = arena.allocate().unwrap();
        arena.deallocate(a);
        arena.deallocate(a);
    }
}
