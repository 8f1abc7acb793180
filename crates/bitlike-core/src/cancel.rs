//! Host-initiated query cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared between a host and a running query.
///
/// The evaluator polls the token between bitmap operations and between
/// verification batches; once fired, the query unwinds with
/// [`QueryError::Cancelled`](crate::QueryError::Cancelled) and its scratch
/// bitmaps are dropped. Tokens are cheap to clone and never reset.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    fired: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every query holding a clone of this token.
    pub fn cancel(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
