//! Slot+generation table mapping `u64` arena handles to owned arenas.
//!
//! C callers never see an arena pointer. A freed handle keeps pointing at
//! its slot, but the slot's generation has moved on, so using it again is
//! reported as an invalid handle instead of touching freed memory.

/// Handle encoding: upper 32 bits = slot index, lower 32 bits = generation.
fn encode(slot: u32, generation: u32) -> u64 {
    (u64::from(slot) << 32) | u64::from(generation)
}

fn decode(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Owning table of values addressed by generation-checked handles.
///
/// Freed slots are recycled through a free list with a bumped generation.
/// A slot whose generation would wrap is retired instead, so an old handle
/// can never alias a new value.
pub(crate) struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> HandleTable<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Take ownership of `value` and return its handle.
    pub fn insert(&mut self, value: T) -> u64 {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.value = Some(value);
            return encode(idx, slot.generation);
        }
        let idx = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        encode(idx, 0)
    }

    /// Mutable access to a live value; `None` for stale or unknown handles.
    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        let (idx, generation) = decode(handle);
        let slot = self.slots.get_mut(idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Shared access to a live value; `None` for stale or unknown handles.
    pub fn get(&self, handle: u64) -> Option<&T> {
        let (idx, generation) = decode(handle);
        let slot = self.slots.get(idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        slot.value.as_ref()
    }

    /// Remove and return a live value. A second remove returns `None`.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (idx, generation) = decode(handle);
        let slot = self.slots.get_mut(idx as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free.push(idx);
        }
        Some(value)
    }

    /// Number of live values.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.value.is_some()).count()
    }
}
