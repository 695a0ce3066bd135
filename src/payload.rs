//! Payload registry - ownership tracking for posted event payloads.
//!
//! The native queue only transports fixed-shape records, so the attribute
//! map of a posted event parks here and the record carries a handle. A
//! handle is `{index, generation}` into a slot arena: taking a payload bumps
//! the slot generation, so stale or foreign handles fail the generation
//! check and read as "no payload" instead of aliasing a live slot.

use crate::types::AttributeMap;

/// Ownership token linking a queued native record to its out-of-band
/// payload. Valid for exactly one take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayloadHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    value: Option<AttributeMap>,
}

/// Slot arena holding payloads in flight through the native queue.
#[derive(Debug, Default)]
pub struct PayloadRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl PayloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a payload and hand back its token. O(1).
    pub fn register(&mut self, payload: AttributeMap) -> PayloadHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(payload);
            return PayloadHandle { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { generation: 0, value: Some(payload) });
        PayloadHandle { index, generation: 0 }
    }

    /// Remove and return the payload for `handle`.
    ///
    /// Returns `None` when the handle was already taken, never registered
    /// here, or survived a `drain_all` - callers must not treat that as
    /// fatal, since records can be inspected speculatively (a peek decodes
    /// without requeueing).
    pub fn take(&mut self, handle: PayloadHandle) -> Option<AttributeMap> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(value)
    }

    /// Number of payloads currently parked.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Release every remaining payload. Safe to call repeatedly; handles
    /// issued before the drain become stale.
    pub fn drain_all(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttrValue;

    fn payload(tag: i64) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert("tag".into(), AttrValue::Int(tag));
        map
    }

    #[test]
    fn test_take_at_most_once() {
        let mut reg = PayloadRegistry::new();
        let h = reg.register(payload(7));
        assert_eq!(reg.len(), 1);

        let got = reg.take(h).expect("first take succeeds");
        assert_eq!(got.get("tag"), Some(&AttrValue::Int(7)));
        assert_eq!(reg.len(), 0);

        assert_eq!(reg.take(h), None);
        assert_eq!(reg.take(h), None);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut reg = PayloadRegistry::new();
        let h1 = reg.register(payload(1));
        reg.take(h1).unwrap();

        // Same slot, new generation.
        let h2 = reg.register(payload(2));
        assert_eq!(reg.take(h1), None);
        assert_eq!(reg.take(h2).unwrap().get("tag"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn test_foreign_handle() {
        let mut reg = PayloadRegistry::new();
        reg.register(payload(1));
        let foreign = PayloadHandle { index: 99, generation: 0 };
        assert_eq!(reg.take(foreign), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_drain_all_idempotent() {
        let mut reg = PayloadRegistry::new();
        let h1 = reg.register(payload(1));
        let _h2 = reg.register(payload(2));
        assert_eq!(reg.len(), 2);

        reg.drain_all();
        assert_eq!(reg.len(), 0);
        assert_eq!(reg.take(h1), None);

        // Second drain on an empty registry is a no-op.
        reg.drain_all();
        assert_eq!(reg.len(), 0);

        // Slots are reusable afterwards.
        let h3 = reg.register(payload(3));
        assert_eq!(reg.take(h3).unwrap().get("tag"), Some(&AttrValue::Int(3)));
    }

    #[test]
    fn test_interleaved_registers_and_takes() {
        let mut reg = PayloadRegistry::new();
        let handles: Vec<_> = (0..5).map(|i| reg.register(payload(i))).collect();
        assert_eq!(reg.len(), 5);

        // Take from the middle, then the head.
        assert!(reg.take(handles[2]).is_some());
        assert!(reg.take(handles[0]).is_some());
        assert_eq!(reg.len(), 3);

        for h in [handles[1], handles[3], handles[4]] {
            assert!(reg.take(h).is_some());
        }
        assert!(reg.is_empty());
    }
}
