//! # `bitlike` Core
//!
//! Positional bitmap index for accelerated SQL `LIKE` matching over a
//! static column of short byte strings.
//!
//! The index keeps, for every byte value, compressed bitmaps of the records
//! carrying that byte at each offset from the start and from the end of the
//! value, plus a byte-anywhere cache and a partition of records by value
//! length. A wildcard pattern (`%` = zero or more bytes, `_` = exactly one
//! byte, no escapes) is compiled into slices and anchors, then answered by
//! bitmap intersections and unions; shapes the bitmaps cannot decide
//! exactly are finished by a per-candidate verification scan. Results are
//! always exact: the same set a full scan with [`matches`] would return.
//!
//! ## Quick Start
//!
//! ```rust
//! use bitlike_core::{LikeIndex, MemoryDriver};
//!
//! let mut driver = MemoryDriver::new();
//! driver.insert_text_column(
//!     "users",
//!     "name",
//!     [Some("alice"), Some("bob"), Some("carol"), None],
//! );
//!
//! let index = LikeIndex::new();
//! index.build(&mut driver, "users", "name")?;
//!
//! assert_eq!(index.count(b"%o%")?, 2); // bob, carol
//! assert_eq!(index.row_ids(b"a%")?.to_vec(), vec![0]); // alice
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Concurrency
//!
//! A built snapshot is immutable; the handle publishes it behind a lock and
//! readers clone an `Arc`, so any number of threads may query while a
//! rebuild is prepared. Rebuilds replace the snapshot wholesale and drop
//! the query cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod cache;
pub mod cancel;
pub mod driver;
pub mod error;
pub mod index;
pub mod matcher;
pub mod pattern;
mod query;

#[cfg(test)]
mod pattern_tests;

pub use cache::CacheStats;
pub use cancel::CancelToken;
pub use driver::{Driver, MemoryDriver, RowIter};
pub use error::{BuildError, DriverError, QueryError};
pub use index::{IndexSnapshot, RecordId, Rows, StatusReport, MAX_POSITIONS};
pub use matcher::matches;
pub use pattern::PatternPlan;

use std::sync::Arc;

use parking_lot::RwLock;

use cache::QueryCache;

/// Default query-cache capacity (patterns).
const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Handle owning the published index for one column.
///
/// The handle itself is cheap; all weight lives in the
/// [`IndexSnapshot`] it publishes. Queries before the first successful
/// [`build`](Self::build) fail with [`QueryError::IndexNotBuilt`].
#[derive(Debug)]
pub struct LikeIndex {
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
    cache: QueryCache,
}

impl Default for LikeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl LikeIndex {
    /// Creates a handle with the default query-cache capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a handle caching at most `capacity` pattern results; zero
    /// disables the cache.
    #[must_use]
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            snapshot: RwLock::new(None),
            cache: QueryCache::new(capacity),
        }
    }

    /// Builds the index from one column and publishes it, replacing any
    /// previous snapshot and invalidating the query cache.
    ///
    /// # Errors
    ///
    /// [`BuildError::DriverFailed`] if the scan errors,
    /// [`BuildError::OutOfMemory`] if ingestion cannot allocate. Either way
    /// the previously published snapshot stays in place.
    pub fn build(
        &self,
        driver: &mut dyn Driver,
        table: &str,
        column: &str,
    ) -> Result<(), BuildError> {
        let rows = driver.scan(table, column).map_err(BuildError::DriverFailed)?;
        let built = IndexSnapshot::build_from(rows)?;
        *self.snapshot.write() = Some(Arc::new(built));
        self.cache.clear();
        Ok(())
    }

    /// The currently published snapshot.
    ///
    /// # Errors
    ///
    /// [`QueryError::IndexNotBuilt`] before the first successful build.
    pub fn snapshot(&self) -> Result<Arc<IndexSnapshot>, QueryError> {
        self.snapshot.read().clone().ok_or(QueryError::IndexNotBuilt)
    }

    /// Number of records matching `pattern`.
    ///
    /// # Errors
    ///
    /// [`QueryError::IndexNotBuilt`] or [`QueryError::PatternTooLong`].
    pub fn count(&self, pattern: &[u8]) -> Result<u64, QueryError> {
        if let Some(ids) = self.cache.get(pattern) {
            return Ok(ids.len() as u64);
        }
        self.snapshot()?.count(pattern)
    }

    /// Cancellable form of [`count`](Self::count).
    ///
    /// # Errors
    ///
    /// As [`count`](Self::count), plus [`QueryError::Cancelled`].
    pub fn count_cancellable(
        &self,
        pattern: &[u8],
        cancel: &CancelToken,
    ) -> Result<u64, QueryError> {
        if let Some(ids) = self.cache.get(pattern) {
            return Ok(ids.len() as u64);
        }
        self.snapshot()?.count_cancellable(pattern, cancel)
    }

    /// Matching record ids in ascending order, served from the query cache
    /// when possible.
    ///
    /// # Errors
    ///
    /// [`QueryError::IndexNotBuilt`] or [`QueryError::PatternTooLong`].
    pub fn row_ids(&self, pattern: &[u8]) -> Result<Arc<[RecordId]>, QueryError> {
        if let Some(ids) = self.cache.get(pattern) {
            return Ok(ids);
        }
        let ids: Arc<[RecordId]> = self.snapshot()?.matching(pattern)?.iter().collect();
        self.cache.insert(pattern, Arc::clone(&ids));
        Ok(ids)
    }

    /// Status of the published snapshot.
    ///
    /// # Errors
    ///
    /// [`QueryError::IndexNotBuilt`] before the first successful build.
    pub fn status(&self) -> Result<StatusReport, QueryError> {
        Ok(self.snapshot()?.status())
    }

    /// Query-cache counters for this handle.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
