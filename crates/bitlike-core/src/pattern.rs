//! Pattern compilation.
//!
//! A wildcard pattern is compiled once per query into a [`PatternPlan`]:
//! the maximal `%`-free runs (slices), the anchor flags, and the minimum
//! value length the pattern can accept. The evaluator dispatches on the
//! plan's shape, so compilation also recognises the fast-path forms
//! (`"%"`, `"%c%"`, wildcard-only patterns).

/// Compiled form of a wildcard pattern.
///
/// Compilation is total: every byte string is a valid pattern. Joining
/// `slices` with single `%` separators (plus the anchor percents) restores
/// the pattern up to collapsed `%%` runs, which are equivalent anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPlan {
    slices: Vec<Box<[u8]>>,
    starts_with_percent: bool,
    ends_with_percent: bool,
    min_length: usize,
    has_percent: bool,
}

impl PatternPlan {
    /// Compiles a pattern into its plan.
    #[must_use]
    pub fn compile(pattern: &[u8]) -> Self {
        let starts_with_percent = pattern.first() == Some(&b'%');
        let ends_with_percent = pattern.last() == Some(&b'%');
        let has_percent = pattern.contains(&b'%');

        let mut slices = Vec::new();
        let mut min_length = 0;
        for part in pattern.split(|&b| b == b'%') {
            if part.is_empty() {
                continue;
            }
            min_length += part.len();
            slices.push(part.to_vec().into_boxed_slice());
        }

        Self {
            slices,
            starts_with_percent,
            ends_with_percent,
            min_length,
            has_percent,
        }
    }

    /// The maximal `%`-free runs of the pattern, in order.
    #[must_use]
    pub fn slices(&self) -> &[Box<[u8]>] {
        &self.slices
    }

    /// Whether the pattern begins with `%`.
    #[must_use]
    pub fn starts_with_percent(&self) -> bool {
        self.starts_with_percent
    }

    /// Whether the pattern ends with `%`.
    #[must_use]
    pub fn ends_with_percent(&self) -> bool {
        self.ends_with_percent
    }

    /// Number of non-`%` pattern bytes; every one consumes a value byte, so
    /// no value shorter than this can match.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Whether the pattern contains at least one `%`.
    #[must_use]
    pub fn has_percent(&self) -> bool {
        self.has_percent
    }

    /// `"%"` and friends: nothing but percents.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.has_percent && self.slices.is_empty()
    }

    /// Patterns built only from `_` and `%`, the empty pattern included.
    /// These are pure length constraints.
    #[must_use]
    pub fn is_pure_wildcard(&self) -> bool {
        self.slices
            .iter()
            .all(|slice| slice.iter().all(|&b| b == b'_'))
    }

    /// The `"%c%"` fast path: a single one-byte literal slice between
    /// anchors. Such a query is answered by the character-anywhere cache
    /// alone, with no verification.
    #[must_use]
    pub fn single_contained_byte(&self) -> Option<u8> {
        if self.starts_with_percent && self.ends_with_percent && self.slices.len() == 1 {
            if let &[b] = self.slices[0].as_ref() {
                if b != b'_' {
                    return Some(b);
                }
            }
        }
        None
    }
}
