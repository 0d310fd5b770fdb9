//! Identity types shared between the update engine and its hosts.
//!
//! Keys are opaque: their numeric value has no meaning beyond equality.

use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of one element handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleKey(u64);

impl HandleKey {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

/// Stable identity of one collection (live query or fixed list).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionKey(u64);

impl CollectionKey {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh raw key, unique for the lifetime of the process.
pub fn next_raw_key() -> u64 {
    NEXT_KEY.fetch_add(1, Ordering::Relaxed)
}

pub fn next_handle_key() -> HandleKey {
    HandleKey::from_raw(next_raw_key())
}

pub fn next_collection_key() -> CollectionKey {
    CollectionKey::from_raw(next_raw_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn allocated_keys_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..64 {
            assert!(seen.insert(next_raw_key()));
        }
    }

    #[test]
    fn handle_and_collection_keys_never_collide() {
        let h = next_handle_key();
        let c = next_collection_key();
        assert_ne!(h.as_raw(), c.as_raw());
    }

    #[test]
    fn key_round_trip() {
        assert_eq!(HandleKey::from_raw(7).as_raw(), 7);
        assert_eq!(CollectionKey::from_raw(9).as_raw(), 9);
    }
}
