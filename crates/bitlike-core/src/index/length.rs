//! Length partition of the record set.
//!
//! `L[k]` holds exactly the records whose value is `k` bytes long, so the
//! partition covers `[0, N)` with no overlap. Positional intersections are
//! always combined with a length filter from here: an `_` consumes a
//! position without contributing a bitmap, and only the length filter
//! guarantees the value actually has a byte at that position.

use roaring::RoaringBitmap;

/// Record sets partitioned by exact value length.
#[derive(Debug)]
pub(crate) struct LengthIndex {
    by_len: Vec<RoaringBitmap>,
    all: RoaringBitmap,
}

impl LengthIndex {
    /// Builds the partition from per-record value lengths.
    pub(crate) fn build(lengths: impl Iterator<Item = usize>, records: u64) -> Self {
        let mut by_len: Vec<RoaringBitmap> = Vec::new();
        for (id, len) in lengths.enumerate() {
            if by_len.len() <= len {
                by_len.resize_with(len + 1, RoaringBitmap::new);
            }
            #[allow(clippy::cast_possible_truncation)]
            by_len[len].insert(id as u32);
        }

        let mut all = RoaringBitmap::new();
        #[allow(clippy::cast_possible_truncation)]
        all.insert_range(0..records as u32);

        Self { by_len, all }
    }

    /// Records whose value is exactly `k` bytes long.
    pub(crate) fn exact(&self, k: usize) -> RoaringBitmap {
        self.by_len.get(k).cloned().unwrap_or_default()
    }

    /// Records whose value is at least `k` bytes long.
    pub(crate) fn at_least(&self, k: usize) -> RoaringBitmap {
        if k == 0 {
            return self.all.clone();
        }
        let mut union = RoaringBitmap::new();
        for bitmap in self.by_len.iter().skip(k) {
            union |= bitmap;
        }
        union
    }

    /// The full record universe `[0, N)`.
    pub(crate) fn all(&self) -> &RoaringBitmap {
        &self.all
    }

    /// Estimated heap footprint of the partition.
    pub(crate) fn memory_bytes(&self) -> usize {
        self.by_len
            .iter()
            .map(RoaringBitmap::serialized_size)
            .sum::<usize>()
            + self.all.serialized_size()
    }
}
