//! Error types for `bitlike`.
//!
//! Build, query and driver failures are kept as separate enums because they
//! surface on different call paths and hosts route them differently. Error
//! codes follow the pattern `BITLIKE-xxx` for easy debugging.

use thiserror::Error;

/// Errors raised by a column driver while scanning source rows.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The requested column does not exist (BITLIKE-001).
    #[error("[BITLIKE-001] column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// Table that was scanned.
        table: String,
        /// Column that was requested.
        column: String,
    },

    /// The underlying row scan failed mid-stream (BITLIKE-002).
    #[error("[BITLIKE-002] scan failed: {0}")]
    Scan(String),
}

/// Errors raised while building an index.
///
/// A failed build never publishes a partial index; the previously published
/// snapshot (if any) stays in place.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The source driver reported an error (BITLIKE-101).
    #[error("[BITLIKE-101] source driver failed: {0}")]
    DriverFailed(#[from] DriverError),

    /// Allocation failed while ingesting values (BITLIKE-102).
    #[error("[BITLIKE-102] out of memory while building index")]
    OutOfMemory,
}

/// Errors raised while evaluating a pattern query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No index has been published yet (BITLIKE-201).
    #[error("[BITLIKE-201] no index has been built")]
    IndexNotBuilt,

    /// The pattern requires more positions than the index stores (BITLIKE-202).
    #[error("[BITLIKE-202] pattern requires {required} positions, index supports at most {max}")]
    PatternTooLong {
        /// Non-`%` byte count of the pattern.
        required: usize,
        /// Maximum indexed positions per value.
        max: usize,
    },

    /// The host cancelled the query (BITLIKE-203).
    #[error("[BITLIKE-203] query cancelled by host")]
    Cancelled,
}

impl DriverError {
    /// Returns the error code (e.g., "BITLIKE-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound { .. } => "BITLIKE-001",
            Self::Scan(_) => "BITLIKE-002",
        }
    }
}

impl BuildError {
    /// Returns the error code (e.g., "BITLIKE-101").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DriverFailed(_) => "BITLIKE-101",
            Self::OutOfMemory => "BITLIKE-102",
        }
    }
}

impl QueryError {
    /// Returns the error code (e.g., "BITLIKE-201").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::IndexNotBuilt => "BITLIKE-201",
            Self::PatternTooLong { .. } => "BITLIKE-202",
            Self::Cancelled => "BITLIKE-203",
        }
    }
}

impl From<std::collections::TryReserveError> for BuildError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
