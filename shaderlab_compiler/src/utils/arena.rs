//! Generation-tagged arena
//!
//! Values live in one reusable buffer owned by the compile context. A
//! [`Handle`] records the generation it was allocated in; after `reset` every
//! older handle resolves to `None` instead of aliasing a newer value.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

// Manual impls: the derives would demand `T: Clone` etc.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@{})", self.index, self.generation)
    }
}

#[derive(Debug)]
pub struct Arena<T> {
    items: Vec<T>,
    generation: u32,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            generation: 0,
        }
    }

    pub fn alloc(&mut self, value: T) -> Handle<T> {
        let index = self.items.len() as u32;
        self.items.push(value);
        Handle {
            index,
            generation: self.generation,
            _marker: PhantomData,
        }
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get(handle.index as usize)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        if handle.generation != self.generation {
            return None;
        }
        self.items.get_mut(handle.index as usize)
    }

    /// Drop every value and invalidate all outstanding handles.
    /// The buffer's capacity is kept for the next compile.
    pub fn reset(&mut self) {
        self.items.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = Arena::new();
        let a = arena.alloc("first".to_string());
        let b = arena.alloc("second".to_string());

        assert_eq!(arena.get(a).map(String::as_str), Some("first"));
        assert_eq!(arena.get(b).map(String::as_str), Some("second"));
        assert_eq!(arena.len(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_reset_invalidates_stale_handles() {
        let mut arena = Arena::new();
        let stale = arena.alloc(1u32);
        arena.reset();

        assert!(arena.is_empty());
        assert_eq!(arena.get(stale), None);

        // Same slot index, new generation
        let fresh = arena.alloc(2u32);
        assert_eq!(fresh.index(), stale.index());
        assert_eq!(arena.get(fresh), Some(&2));
        assert_eq!(arena.get(stale), None);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = Arena::new();
        let handle = arena.alloc(vec![1, 2]);
        arena.get_mut(handle).unwrap().push(3);
        assert_eq!(arena.get(handle).unwrap().len(), 3);
    }
}
