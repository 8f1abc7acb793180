//! Pattern evaluation over a built snapshot.
//!
//! The evaluator dispatches on the compiled plan's shape and answers each
//! shape with the cheapest bitmap algebra that is still exact:
//!
//! | Shape | Strategy |
//! |---|---|
//! | `%` | full universe |
//! | `_`/`%` only | length partition (exact or at-least) |
//! | no `%` | forward positions ∧ exact length |
//! | `s%` | forward positions ∧ length ≥ len |
//! | `%s` | reverse positions ∧ length ≥ len |
//! | `s1%s2` | both anchors ∧ length ≥ min |
//! | `%c%` | character-anywhere cache, verbatim |
//! | contains / multi-slice | character candidates ∧ length ∧ anchors, then per-candidate verification |
//!
//! The character-anywhere candidates are necessary but not sufficient, so
//! the last row verifies every survivor with the ordered-slice scan. Every
//! positional intersection carries a length filter: an `_` consumes a
//! position without contributing a bitmap, and only the length filter
//! proves the byte exists. Any empty intermediate short-circuits to the
//! empty result.

#[cfg(test)]
mod tests;

use roaring::RoaringBitmap;

use crate::cancel::CancelToken;
use crate::error::QueryError;
use crate::index::{IndexSnapshot, MAX_POSITIONS};
use crate::matcher::ordered_slices_match;
use crate::pattern::PatternPlan;

/// Verification iterations between cancellation polls.
const CANCEL_STRIDE: usize = 1024;

/// Evaluates a compiled pattern against a snapshot.
pub(crate) fn evaluate(
    snapshot: &IndexSnapshot,
    plan: &PatternPlan,
    cancel: Option<&CancelToken>,
) -> Result<RoaringBitmap, QueryError> {
    if plan.min_length() > MAX_POSITIONS {
        return Err(QueryError::PatternTooLong {
            required: plan.min_length(),
            max: MAX_POSITIONS,
        });
    }

    let eval = Evaluator { snapshot, cancel };
    eval.dispatch(plan)
}

struct Evaluator<'a> {
    snapshot: &'a IndexSnapshot,
    cancel: Option<&'a CancelToken>,
}

impl Evaluator<'_> {
    fn dispatch(&self, plan: &PatternPlan) -> Result<RoaringBitmap, QueryError> {
        let slices = plan.slices();

        if plan.is_match_all() {
            tracing::debug!(strategy = "match_all", "like dispatch");
            return Ok(self.snapshot.lengths().all().clone());
        }

        if plan.is_pure_wildcard() {
            // Only `_` and `%`: a pure length constraint. Covers the empty
            // pattern (exact length zero) as well.
            if plan.has_percent() {
                tracing::debug!(strategy = "length_at_least", "like dispatch");
                return Ok(self.snapshot.lengths().at_least(plan.min_length()));
            }
            tracing::debug!(strategy = "length_exact", "like dispatch");
            return Ok(self.snapshot.lengths().exact(plan.min_length()));
        }

        if !plan.has_percent() {
            tracing::debug!(strategy = "exact", "like dispatch");
            return self.exact(plan);
        }

        if slices.len() == 1 && !plan.starts_with_percent() && plan.ends_with_percent() {
            tracing::debug!(strategy = "prefix", "like dispatch");
            return self.match_at_start(&slices[0]);
        }

        if slices.len() == 1 && plan.starts_with_percent() && !plan.ends_with_percent() {
            tracing::debug!(strategy = "suffix", "like dispatch");
            return self.match_at_end(&slices[0]);
        }

        if slices.len() == 2 && !plan.starts_with_percent() && !plan.ends_with_percent() {
            tracing::debug!(strategy = "dual_anchor", "like dispatch");
            return self.dual_anchor(plan);
        }

        if let Some(byte) = plan.single_contained_byte() {
            // `%c%`: presence of the byte is the whole predicate.
            tracing::debug!(strategy = "char_anywhere", "like dispatch");
            return Ok(self.snapshot.char_anywhere(byte).clone());
        }

        tracing::debug!(strategy = "multi_slice", "like dispatch");
        self.multi_slice(plan)
    }

    fn check_cancel(&self) -> Result<(), QueryError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(QueryError::Cancelled),
            _ => Ok(()),
        }
    }

    /// No `%` in the pattern: positional intersection under *exact* length.
    /// SQL semantics: `'abc'` must not match `'abcd'` or `'xabc'`.
    fn exact(&self, plan: &PatternPlan) -> Result<RoaringBitmap, QueryError> {
        let mut result = self.snapshot.lengths().exact(plan.min_length());
        if result.is_empty() {
            return Ok(result);
        }
        if let Some(slice) = plan.slices().first() {
            self.intersect_forward(&mut result, slice)?;
        }
        Ok(result)
    }

    /// Forward positional match anchored at offset 0, with the mandatory
    /// `length ≥ len(slice)` filter.
    fn match_at_start(&self, slice: &[u8]) -> Result<RoaringBitmap, QueryError> {
        let mut result = self.snapshot.lengths().at_least(slice.len());
        if result.is_empty() {
            return Ok(result);
        }
        self.intersect_forward(&mut result, slice)?;
        Ok(result)
    }

    /// Reverse positional match anchored at the end of the value, with the
    /// mandatory `length ≥ len(slice)` filter.
    fn match_at_end(&self, slice: &[u8]) -> Result<RoaringBitmap, QueryError> {
        let mut result = self.snapshot.lengths().at_least(slice.len());
        if result.is_empty() {
            return Ok(result);
        }
        self.intersect_reverse(&mut result, slice)?;
        Ok(result)
    }

    /// `s1%s2`: both anchors plus the combined length filter. The length
    /// filter is what keeps the two anchors from overlapping on short
    /// values (`'a%a'` must not match `'a'`).
    fn dual_anchor(&self, plan: &PatternPlan) -> Result<RoaringBitmap, QueryError> {
        let mut result = self.snapshot.lengths().at_least(plan.min_length());
        if result.is_empty() {
            return Ok(result);
        }
        self.intersect_forward(&mut result, &plan.slices()[0])?;
        if result.is_empty() {
            return Ok(result);
        }
        self.intersect_reverse(&mut result, &plan.slices()[1])?;
        Ok(result)
    }

    /// Contains and general multi-slice shapes: candidate filtering through
    /// the character-anywhere cache, then exact verification.
    fn multi_slice(&self, plan: &PatternPlan) -> Result<RoaringBitmap, QueryError> {
        let mut result = match self.char_candidates(plan)? {
            Some(candidates) => candidates,
            None => return Ok(RoaringBitmap::new()),
        };
        if result.is_empty() {
            return Ok(result);
        }

        self.check_cancel()?;
        result &= &self.snapshot.lengths().at_least(plan.min_length());
        if result.is_empty() {
            return Ok(result);
        }

        if !plan.starts_with_percent() {
            if let Some(first) = plan.slices().first() {
                self.check_cancel()?;
                result &= &self.match_at_start(first)?;
                if result.is_empty() {
                    return Ok(result);
                }
            }
        }

        if !plan.ends_with_percent() {
            if let Some(last) = plan.slices().last() {
                self.check_cancel()?;
                result &= &self.match_at_end(last)?;
                if result.is_empty() {
                    return Ok(result);
                }
            }
        }

        self.verify(plan, &result)
    }

    /// Intersection of `A[c]` over the unique literal bytes of all slices.
    /// Repeated bytes are intersected once; `None` means no literal byte
    /// occurs anywhere, which the dispatcher has already ruled out.
    fn char_candidates(&self, plan: &PatternPlan) -> Result<Option<RoaringBitmap>, QueryError> {
        let mut seen = [false; 256];
        let mut result: Option<RoaringBitmap> = None;

        for slice in plan.slices() {
            for &byte in slice.iter() {
                if byte == b'_' || seen[usize::from(byte)] {
                    continue;
                }
                seen[usize::from(byte)] = true;

                let anywhere = self.snapshot.char_anywhere(byte);
                if anywhere.is_empty() {
                    return Ok(Some(RoaringBitmap::new()));
                }
                match result.as_mut() {
                    None => result = Some(anywhere.clone()),
                    Some(acc) => {
                        self.check_cancel()?;
                        *acc &= anywhere;
                        if acc.is_empty() {
                            return Ok(Some(RoaringBitmap::new()));
                        }
                    }
                }
            }
        }

        Ok(result)
    }

    /// Runs the ordered-slice scan over every candidate, keeping exact
    /// matches only.
    fn verify(&self, plan: &PatternPlan, candidates: &RoaringBitmap) -> Result<RoaringBitmap, QueryError> {
        let mut verified = RoaringBitmap::new();
        for (checked, id) in candidates.iter().enumerate() {
            if checked % CANCEL_STRIDE == 0 {
                self.check_cancel()?;
            }
            let value = self.snapshot.value(id);
            if ordered_slices_match(
                value,
                plan.slices(),
                plan.starts_with_percent(),
                plan.ends_with_percent(),
            ) {
                verified.insert(id);
            }
        }
        Ok(verified)
    }

    /// ANDs the forward positional bitmaps of `slice` (anchored at offset 0)
    /// into `result`, skipping `_` positions, with early-empty exit.
    fn intersect_forward(
        &self,
        result: &mut RoaringBitmap,
        slice: &[u8],
    ) -> Result<(), QueryError> {
        for (pos, &byte) in slice.iter().enumerate() {
            if byte == b'_' {
                continue;
            }
            self.check_cancel()?;
            match self.snapshot.positions().forward(byte, pos) {
                Some(bitmap) => {
                    *result &= bitmap;
                    if result.is_empty() {
                        return Ok(());
                    }
                }
                None => {
                    result.clear();
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// ANDs the reverse positional bitmaps of `slice` (anchored at the end
    /// of the value) into `result`. Reverse offset `i` is the `i`-th byte
    /// from the end, so `slice[len-1-i]` is matched at reverse offset `i`.
    fn intersect_reverse(
        &self,
        result: &mut RoaringBitmap,
        slice: &[u8],
    ) -> Result<(), QueryError> {
        for (pos, &byte) in slice.iter().rev().enumerate() {
            if byte == b'_' {
                continue;
            }
            self.check_cancel()?;
            match self.snapshot.positions().reverse(byte, pos) {
                Some(bitmap) => {
                    *result &= bitmap;
                    if result.is_empty() {
                        return Ok(());
                    }
                }
                None => {
                    result.clear();
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
