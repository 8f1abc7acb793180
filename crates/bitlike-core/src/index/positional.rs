//! Per-position bitmap families.
//!
//! Two families of `(byte, position) → RoaringBitmap` maps: the forward
//! family answers "which records have byte `c` at offset `i`", the reverse
//! family answers the same for the `j`-th byte counted from the end of the
//! value. Each family is a per-byte hash map keyed by position, so lookup
//! is O(1) and absent entries mean the empty set.

use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

use super::{RecordId, MAX_POSITIONS};

type PositionMap = FxHashMap<u16, RoaringBitmap>;

/// Forward and reverse positional bitmap families.
#[derive(Debug)]
pub(crate) struct PositionalIndex {
    forward: Box<[PositionMap]>,
    reverse: Box<[PositionMap]>,
}

impl PositionalIndex {
    pub(crate) fn new() -> Self {
        Self {
            forward: vec![PositionMap::default(); 256].into_boxed_slice(),
            reverse: vec![PositionMap::default(); 256].into_boxed_slice(),
        }
    }

    /// Records `id` as having `byte` at forward offset `pos`.
    pub(crate) fn insert_forward(&mut self, byte: u8, pos: usize, id: RecordId) {
        debug_assert!(pos < MAX_POSITIONS);
        #[allow(clippy::cast_possible_truncation)]
        self.forward[usize::from(byte)]
            .entry(pos as u16)
            .or_default()
            .insert(id);
    }

    /// Records `id` as having `byte` at reverse offset `pos` (0 = last byte).
    pub(crate) fn insert_reverse(&mut self, byte: u8, pos: usize, id: RecordId) {
        debug_assert!(pos < MAX_POSITIONS);
        #[allow(clippy::cast_possible_truncation)]
        self.reverse[usize::from(byte)]
            .entry(pos as u16)
            .or_default()
            .insert(id);
    }

    /// Records having `byte` at forward offset `pos`, if any.
    pub(crate) fn forward(&self, byte: u8, pos: usize) -> Option<&RoaringBitmap> {
        u16::try_from(pos)
            .ok()
            .and_then(|pos| self.forward[usize::from(byte)].get(&pos))
    }

    /// Records having `byte` at reverse offset `pos`, if any.
    pub(crate) fn reverse(&self, byte: u8, pos: usize) -> Option<&RoaringBitmap> {
        u16::try_from(pos)
            .ok()
            .and_then(|pos| self.reverse[usize::from(byte)].get(&pos))
    }

    /// Union of the forward family over every position, for one byte.
    pub(crate) fn union_forward(&self, byte: u8) -> RoaringBitmap {
        let mut union = RoaringBitmap::new();
        for bitmap in self.forward[usize::from(byte)].values() {
            union |= bitmap;
        }
        union
    }

    /// Estimated heap footprint of both families.
    pub(crate) fn memory_bytes(&self) -> usize {
        let entry_overhead = std::mem::size_of::<u16>() + std::mem::size_of::<RoaringBitmap>();
        self.forward
            .iter()
            .chain(self.reverse.iter())
            .flat_map(|map| map.values())
            .map(|bitmap| bitmap.serialized_size() + entry_overhead)
            .sum()
    }
}
