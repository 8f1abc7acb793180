//! The built index and its construction.
//!
//! An [`IndexSnapshot`] is the immutable product of one build pass over a
//! column: the stored values, the forward and reverse positional bitmap
//! families, the character-anywhere cache and the length partition. It is
//! published behind the [`LikeIndex`](crate::LikeIndex) handle and shared
//! with readers through an `Arc`; a rebuild replaces it wholesale, so a
//! snapshot never mutates after construction and is race-free for
//! concurrent readers.

mod length;
mod positional;


use std::time::Instant;

use roaring::RoaringBitmap;
use serde::Serialize;

use crate::cancel::CancelToken;
use crate::error::{BuildError, DriverError, QueryError};
use crate::pattern::PatternPlan;
use crate::query;

pub(crate) use length::LengthIndex;
pub(crate) use positional::PositionalIndex;

/// Dense record identifier assigned in scan order during a build.
pub type RecordId = u32;

/// Maximum value positions indexed per record. Longer values are stored in
/// full but only their first and last `MAX_POSITIONS` bytes are indexed
/// positionally.
pub const MAX_POSITIONS: usize = 256;

/// Read-only report of a snapshot's shape and footprint.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Number of indexed records.
    pub records: u64,
    /// Length of the longest stored value.
    pub max_len: usize,
    /// Estimated heap footprint: bitmap bytes plus stored values and
    /// table metadata.
    pub memory_bytes: usize,
    /// Bitmap backend identifier.
    pub backend: &'static str,
}

/// An immutable, fully built index over one column.
#[derive(Debug)]
pub struct IndexSnapshot {
    values: Vec<Box<[u8]>>,
    positions: PositionalIndex,
    char_anywhere: Vec<RoaringBitmap>,
    lengths: LengthIndex,
    max_len: usize,
    memory_bytes: usize,
}

impl IndexSnapshot {
    /// Ingests `(RecordId, Value)` pairs in scan order and derives every
    /// bitmap family. `None` rows (SQL NULL) become empty values.
    ///
    /// Any row error discards the partial build and surfaces as
    /// [`BuildError::DriverFailed`].
    ///
    /// # Panics
    ///
    /// Panics if the source yields more than `u32::MAX` rows; record ids
    /// are dense 32-bit values.
    pub(crate) fn build_from<I>(rows: I) -> Result<Self, BuildError>
    where
        I: Iterator<Item = Result<Option<Vec<u8>>, DriverError>>,
    {
        let started = Instant::now();

        let mut values: Vec<Box<[u8]>> = Vec::new();
        for row in rows {
            let row = row?;
            values.try_reserve(1)?;
            values.push(row.unwrap_or_default().into_boxed_slice());
        }
        assert!(
            u32::try_from(values.len()).is_ok(),
            "index overflow: cannot assign dense 32-bit ids to {} records",
            values.len()
        );

        let mut positions = PositionalIndex::new();
        let mut max_len = 0;
        for (id, value) in values.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = id as RecordId;
            let len = value.len();
            max_len = max_len.max(len);
            // Values longer than MAX_POSITIONS are indexed on their first
            // and last MAX_POSITIONS bytes only.
            for pos in 0..len.min(MAX_POSITIONS) {
                positions.insert_forward(value[pos], pos, id);
                positions.insert_reverse(value[len - 1 - pos], pos, id);
            }
        }

        let char_anywhere: Vec<RoaringBitmap> =
            (0..=u8::MAX).map(|byte| positions.union_forward(byte)).collect();

        let lengths = LengthIndex::build(values.iter().map(|v| v.len()), values.len() as u64);

        let memory_bytes = positions.memory_bytes()
            + char_anywhere
                .iter()
                .map(RoaringBitmap::serialized_size)
                .sum::<usize>()
            + lengths.memory_bytes()
            + values.iter().map(|v| v.len()).sum::<usize>()
            + values.len() * std::mem::size_of::<Box<[u8]>>();

        let snapshot = Self {
            values,
            positions,
            char_anywhere,
            lengths,
            max_len,
            memory_bytes,
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            records = snapshot.values.len(),
            max_len = snapshot.max_len,
            memory_bytes = snapshot.memory_bytes,
            elapsed_ms,
            "index built"
        );

        Ok(snapshot)
    }

    /// Number of indexed records.
    #[must_use]
    pub fn record_count(&self) -> u64 {
        self.values.len() as u64
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The stored value for a record id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not assigned by this snapshot's build.
    #[must_use]
    pub fn value(&self, id: RecordId) -> &[u8] {
        &self.values[id as usize]
    }

    /// Length of the longest stored value.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Evaluates a pattern to the exact set of matching record ids.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::PatternTooLong`] if the pattern's non-`%` byte
    /// count exceeds [`MAX_POSITIONS`].
    pub fn matching(&self, pattern: &[u8]) -> Result<RoaringBitmap, QueryError> {
        let plan = PatternPlan::compile(pattern);
        query::evaluate(self, &plan, None)
    }

    /// Like [`matching`](Self::matching), polling `cancel` between bitmap
    /// operations and verification batches.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Cancelled`] once the token fires, or
    /// [`QueryError::PatternTooLong`] as for `matching`.
    pub fn matching_cancellable(
        &self,
        pattern: &[u8],
        cancel: &CancelToken,
    ) -> Result<RoaringBitmap, QueryError> {
        let plan = PatternPlan::compile(pattern);
        query::evaluate(self, &plan, Some(cancel))
    }

    /// Number of records matching the pattern, without materialising ids.
    ///
    /// # Errors
    ///
    /// Same contract as [`matching`](Self::matching).
    pub fn count(&self, pattern: &[u8]) -> Result<u64, QueryError> {
        Ok(self.matching(pattern)?.len())
    }

    /// Cancellable form of [`count`](Self::count).
    ///
    /// # Errors
    ///
    /// Same contract as [`matching_cancellable`](Self::matching_cancellable).
    pub fn count_cancellable(
        &self,
        pattern: &[u8],
        cancel: &CancelToken,
    ) -> Result<u64, QueryError> {
        Ok(self.matching_cancellable(pattern, cancel)?.len())
    }

    /// Iterates matching `(RecordId, value)` pairs in ascending id order.
    ///
    /// The iterator borrows this snapshot; a concurrent rebuild of the
    /// owning handle does not affect it.
    ///
    /// # Errors
    ///
    /// Same contract as [`matching`](Self::matching).
    pub fn rows(&self, pattern: &[u8]) -> Result<Rows<'_>, QueryError> {
        let ids: Vec<RecordId> = self.matching(pattern)?.iter().collect();
        Ok(Rows {
            snapshot: self,
            ids: ids.into_iter(),
        })
    }

    /// Cancellable form of [`rows`](Self::rows).
    ///
    /// # Errors
    ///
    /// Same contract as [`matching_cancellable`](Self::matching_cancellable).
    pub fn rows_cancellable(
        &self,
        pattern: &[u8],
        cancel: &CancelToken,
    ) -> Result<Rows<'_>, QueryError> {
        let ids: Vec<RecordId> = self.matching_cancellable(pattern, cancel)?.iter().collect();
        Ok(Rows {
            snapshot: self,
            ids: ids.into_iter(),
        })
    }

    /// Shape and footprint of this snapshot. Read-only and lock-free.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        StatusReport {
            records: self.record_count(),
            max_len: self.max_len,
            memory_bytes: self.memory_bytes,
            backend: "roaring",
        }
    }

    pub(crate) fn positions(&self) -> &PositionalIndex {
        &self.positions
    }

    /// Records containing `byte` anywhere: `A[c] = ⋃ᵢ P⁺[c][i]`.
    pub(crate) fn char_anywhere(&self, byte: u8) -> &RoaringBitmap {
        &self.char_anywhere[usize::from(byte)]
    }

    pub(crate) fn lengths(&self) -> &LengthIndex {
        &self.lengths
    }
}

/// Iterator over matching `(RecordId, value)` pairs, ascending by id.
#[derive(Debug)]
pub struct Rows<'a> {
    snapshot: &'a IndexSnapshot,
    ids: std::vec::IntoIter<RecordId>,
}

impl<'a> Iterator for Rows<'a> {
    type Item = (RecordId, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        Some((id, self.snapshot.value(id)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl ExactSizeIterator for Rows<'_> {}
