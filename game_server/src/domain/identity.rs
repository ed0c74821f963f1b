// Stable color and bot-name slots for players in a room.

pub const BOT_NAMES: [&str; 8] = [
    "Nova", "Comet", "Pulsar", "Quasar", "Vega", "Orion", "Rigel", "Lyra",
];

/// Hands out the lowest free index in `0..capacity` and takes it back on release.
#[derive(Debug, Clone)]
pub struct IdentityAllocator {
    taken: Vec<bool>,
}

impl IdentityAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            taken: vec![false; capacity],
        }
    }

    pub fn allocate(&mut self) -> Option<usize> {
        let index = self.taken.iter().position(|t| !t)?;
        self.taken[index] = true;
        Some(index)
    }

    /// Releasing an index that is not taken is a no-op.
    pub fn release(&mut self, index: usize) {
        if let Some(slot) = self.taken.get_mut(index) {
            *slot = false;
        }
    }

    pub fn is_taken(&self, index: usize) -> bool {
        self.taken.get(index).copied().unwrap_or(false)
    }

    pub fn in_use(&self) -> usize {
        self.taken.iter().filter(|t| **t).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_slots_are_allocated_then_lowest_free_index_comes_first() {
        let mut colors = IdentityAllocator::new(4);
        assert_eq!(colors.allocate(), Some(0));
        assert_eq!(colors.allocate(), Some(1));
        assert_eq!(colors.allocate(), Some(2));

        colors.release(1);

        assert_eq!(colors.allocate(), Some(1));
        assert_eq!(colors.allocate(), Some(3));
        assert_eq!(colors.allocate(), None);
        assert_eq!(colors.in_use(), 4);
    }

    #[test]
    fn when_unknown_index_is_released_then_nothing_changes() {
        let mut colors = IdentityAllocator::new(2);
        colors.release(7);
        colors.release(0);
        assert_eq!(colors.in_use(), 0);
        assert!(!colors.is_taken(7));
    }
}
