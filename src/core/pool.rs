//! Fixed-capacity handle pool
//!
//! Slots are allocated once and reused in place. A slot is free when it holds
//! `None`; closing a handle clears its slot back to `None`.

#[derive(Debug)]
pub struct HandlePool<T> {
    slots: Vec<Option<T>>,
}

impl<T> HandlePool<T> {
    /// Create a pool with `capacity` free slots
    pub fn new(capacity: usize) -> Self {
        HandlePool {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Place `value` in the first free slot
    ///
    /// Returns the slot index, or gives `value` back if every slot is taken.
    pub fn acquire(&mut self, value: T) -> Result<usize, T> {
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(value);
                Ok(index)
            }
            None => Err(value),
        }
    }

    /// Free slot `index`, returning what it held
    pub fn release(&mut self, index: usize) -> Option<T> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Free every slot
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }
}
