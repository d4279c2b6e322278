/// Unweighted round-robin cursor over a fixed number of worker slots.
///
/// Every call advances the cursor regardless of worker load.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    cursor: usize,
    slots: usize,
}

impl RoundRobin {
    /// Create a scheduler over `slots` workers (at least one).
    pub fn new(slots: usize) -> Self {
        Self {
            cursor: 0,
            slots: slots.max(1),
        }
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Return the current slot and advance.
    pub fn next_slot(&mut self) -> usize {
        let slot = self.cursor;
        self.cursor = (self.cursor + 1) % self.slots;
        slot
    }
}
