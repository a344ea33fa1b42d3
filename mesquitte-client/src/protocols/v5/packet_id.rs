//! Packet identifier allocation.
//!
//! Identifiers are non-zero 16-bit values tagging QoS 1/2 PUBLISH flows. An identifier
//! stays in use until its flow completes or a failed send hands it back.

use foldhash::{HashSet, HashSetExt};

#[derive(Debug)]
pub struct PacketIdPool {
    max: u16,
    next_id: u16,
    in_use: HashSet<u16>,
}

impl Default for PacketIdPool {
    fn default() -> Self {
        Self::new(u16::MAX)
    }
}

impl PacketIdPool {
    /// Pool handing out identifiers in `1..=max`.
    pub fn new(max: u16) -> Self {
        Self {
            max: max.max(1),
            next_id: 1,
            in_use: HashSet::new(),
        }
    }

    /// Returns `None` once every identifier in the pool is in use.
    pub fn acquire_unique(&mut self) -> Option<u16> {
        if self.in_use.len() >= self.max as usize {
            return None;
        }

        loop {
            let id = self.next_id;
            self.advance_next();
            if self.in_use.insert(id) {
                return Some(id);
            }
        }
    }

    /// Claims a caller chosen identifier, false if it is already taken or out of range.
    pub fn register(&mut self, id: u16) -> bool {
        if id == 0 || id > self.max {
            return false;
        }
        self.in_use.insert(id)
    }

    /// Returns whether the identifier was in use.
    pub fn release(&mut self, id: u16) -> bool {
        self.in_use.remove(&id)
    }

    pub fn is_in_use(&self, id: u16) -> bool {
        self.in_use.contains(&id)
    }

    fn advance_next(&mut self) {
        self.next_id = if self.next_id >= self.max {
            1
        } else {
            self.next_id + 1
        };
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sequential_acquire() {
        let mut pool = PacketIdPool::default();
        assert_eq!(pool.acquire_unique(), Some(1));
        assert_eq!(pool.acquire_unique(), Some(2));
        assert_eq!(pool.acquire_unique(), Some(3));
        assert!((1..=3).all(|id| pool.is_in_use(id)));
    }

    #[test]
    fn release_and_reuse() {
        let mut pool = PacketIdPool::new(2);
        let id1 = pool.acquire_unique().unwrap();
        let id2 = pool.acquire_unique().unwrap();
        assert_ne!(id1, id2);
        assert_eq!(pool.acquire_unique(), None);

        assert!(pool.release(id1));
        assert!(!pool.release(id1));
        assert!(!pool.is_in_use(id1));
        assert_eq!(pool.acquire_unique(), Some(id1));
    }

    #[test]
    fn wraps_and_skips_zero() {
        let mut pool = PacketIdPool::new(3);
        assert_eq!(pool.acquire_unique(), Some(1));
        assert_eq!(pool.acquire_unique(), Some(2));
        assert_eq!(pool.acquire_unique(), Some(3));
        pool.release(1);
        assert_eq!(pool.acquire_unique(), Some(1));
    }

    #[test]
    fn skips_registered() {
        let mut pool = PacketIdPool::default();
        assert!(pool.register(1));
        assert!(!pool.register(1));
        assert!(!pool.register(0));
        assert_eq!(pool.acquire_unique(), Some(2));
    }
}
