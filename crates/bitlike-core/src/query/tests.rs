//! Strategy-level tests for the evaluator, including the literal
//! acceptance scenarios for each dispatch shape.

use roaring::RoaringBitmap;

use crate::cancel::CancelToken;
use crate::error::QueryError;
use crate::index::{IndexSnapshot, MAX_POSITIONS};
use crate::matcher::matches;

fn snapshot(values: &[&str]) -> IndexSnapshot {
    IndexSnapshot::build_from(values.iter().map(|v| Ok(Some(v.as_bytes().to_vec()))))
        .expect("build")
}

fn ids(snap: &IndexSnapshot, pattern: &[u8]) -> Vec<u32> {
    snap.matching(pattern).expect("query").iter().collect()
}

/// Ground truth by scanning every stored value with the exact matcher.
fn naive(snap: &IndexSnapshot, pattern: &[u8]) -> Vec<u32> {
    let records = u32::try_from(snap.record_count()).expect("test corpus fits u32");
    (0..records)
        .filter(|&id| matches(snap.value(id), pattern))
        .collect()
}

#[test]
fn test_match_all_returns_every_record() {
    let snap = snapshot(&["a", "bb", "", "ccc"]);
    assert_eq!(ids(&snap, b"%"), vec![0, 1, 2, 3]);
    assert_eq!(ids(&snap, b"%%"), vec![0, 1, 2, 3]);
    assert_eq!(snap.count(b"%").expect("count"), 4);
}

#[test]
fn test_exact_requires_exact_length() {
    let snap = snapshot(&["abc", "abcd", "xabc"]);
    assert_eq!(ids(&snap, b"abc"), vec![0]);
}

#[test]
fn test_exact_with_underscores() {
    let snap = snapshot(&["abc", "adc", "abcd", "ab"]);
    assert_eq!(ids(&snap, b"a_c"), vec![0, 1]);
    assert_eq!(ids(&snap, b"___"), vec![0, 1]);
}

#[test]
fn test_empty_pattern_matches_only_empty_values() {
    let snap = snapshot(&["", "a", ""]);
    assert_eq!(ids(&snap, b""), vec![0, 2]);
}

#[test]
fn test_pure_wildcard_lengths() {
    let snap = snapshot(&["", "a", "ab", "abc", "abcd"]);
    assert_eq!(ids(&snap, b"___"), vec![3]);
    assert_eq!(ids(&snap, b"_%_"), vec![2, 3, 4]);
    assert_eq!(ids(&snap, b"_"), vec![1]);
    assert_eq!(ids(&snap, b"__%"), vec![2, 3, 4]);
    assert_eq!(ids(&snap, b"%__%"), vec![2, 3, 4]);
}

#[test]
fn test_prefix() {
    let snap = snapshot(&["apple", "apricot", "banana", "ap"]);
    assert_eq!(ids(&snap, b"ap%"), vec![0, 1, 3]);
    assert_eq!(ids(&snap, b"app%"), vec![0]);
    // Underscores inside the prefix still demand the position to exist.
    assert_eq!(ids(&snap, b"_p%"), vec![0, 1, 3]);
    assert_eq!(ids(&snap, b"ap_%"), vec![0, 1]);
}

#[test]
fn test_suffix() {
    let snap = snapshot(&["box", "fox", "ox", "x", "oxen"]);
    assert_eq!(ids(&snap, b"%ox"), vec![0, 1, 2]);
    assert_eq!(ids(&snap, b"%x"), vec![0, 1, 2, 3]);
    assert_eq!(ids(&snap, b"%_x"), vec![0, 1, 2]);
}

#[test]
fn test_dual_anchor() {
    let snap = snapshot(&["arc", "antic", "ac", "a", "brace"]);
    assert_eq!(ids(&snap, b"a%c"), vec![0, 1, 2]);
    // The length filter keeps the anchors from overlapping: 'a%a' has
    // min_length 2 and must not match the single byte 'a'.
    let snap = snapshot(&["a", "aa", "aba"]);
    assert_eq!(ids(&snap, b"a%a"), vec![1, 2]);
}

#[test]
fn test_single_char_contains_uses_char_cache() {
    let snap = snapshot(&["abc", "bcd", "cde", "xyz"]);
    assert_eq!(ids(&snap, b"%c%"), vec![0, 1, 2]);
    assert_eq!(ids(&snap, b"%c%"), naive(&snap, b"%c%"));
}

#[test]
fn test_contains_verifies_order() {
    // All three values contain both bytes; only some contain the substring.
    let snap = snapshot(&["abba", "baab", "ab", "ba"]);
    assert_eq!(ids(&snap, b"%ab%"), vec![0, 1, 2]);
    assert_eq!(ids(&snap, b"%ab%"), naive(&snap, b"%ab%"));
}

#[test]
fn test_contains_with_underscore() {
    let snap = snapshot(&["axc", "abc", "ac", "xaxcx"]);
    assert_eq!(ids(&snap, b"%a_c%"), vec![0, 1, 3]);
}

#[test]
fn test_multi_slice_in_order() {
    let snap = snapshot(&["abc", "cab", "acb", "aXbXc", "cba"]);
    assert_eq!(ids(&snap, b"%a%b%c%"), vec![0, 3]);
    assert_eq!(ids(&snap, b"%a%b%c%"), naive(&snap, b"%a%b%c%"));
}

#[test]
fn test_multi_slice_with_head_anchor() {
    let snap = snapshot(&["abxc", "xabc", "abc", "ab"]);
    assert_eq!(ids(&snap, b"ab%c%"), naive(&snap, b"ab%c%"));
    assert_eq!(ids(&snap, b"ab%c%"), vec![0, 2]);
}

#[test]
fn test_multi_slice_with_tail_anchor() {
    let snap = snapshot(&["abxc", "abcx", "abc", "bc"]);
    assert_eq!(ids(&snap, b"%a%c"), naive(&snap, b"%a%c"));
    assert_eq!(ids(&snap, b"%a%c"), vec![0, 2]);
}

#[test]
fn test_multi_slice_both_anchors() {
    let snap = snapshot(&["a-b-c", "abc", "axbxcx", "ab"]);
    assert_eq!(ids(&snap, b"a%b%c"), naive(&snap, b"a%b%c"));
}

#[test]
fn test_repeated_bytes_deduplicate_in_candidates() {
    let snap = snapshot(&["abcabc", "abc", "abcab", "xyz"]);
    assert_eq!(ids(&snap, b"%abcabc%"), vec![0]);
    assert_eq!(ids(&snap, b"%abcabc%"), naive(&snap, b"%abcabc%"));
}

#[test]
fn test_missing_byte_short_circuits_to_empty() {
    let snap = snapshot(&["abc", "def"]);
    assert!(ids(&snap, b"z%").is_empty());
    assert!(ids(&snap, b"%z").is_empty());
    assert!(ids(&snap, b"%z%").is_empty());
    assert!(ids(&snap, b"%a%z%").is_empty());
}

#[test]
fn test_pattern_too_long() {
    let snap = snapshot(&["abc"]);
    let pattern = vec![b'a'; MAX_POSITIONS + 1];
    let err = snap.matching(&pattern).expect_err("must fail");
    assert_eq!(
        err,
        QueryError::PatternTooLong {
            required: MAX_POSITIONS + 1,
            max: MAX_POSITIONS,
        }
    );
    // Wildcard-heavy patterns hit the same limit: every `_` is a required byte.
    let mut pattern = vec![b'_'; MAX_POSITIONS + 1];
    pattern.push(b'%');
    assert!(snap.matching(&pattern).is_err());
}

#[test]
fn test_pattern_at_limit_is_accepted() {
    let snap = snapshot(&["abc"]);
    let pattern = vec![b'a'; MAX_POSITIONS];
    assert!(snap.matching(&pattern).expect("in-limit query").is_empty());
}

#[test]
fn test_cancelled_token_aborts() {
    let snap = snapshot(&["abc", "bcd", "cde"]);
    let token = CancelToken::new();
    token.cancel();
    assert_eq!(
        snap.count_cancellable(b"%a%b%", &token),
        Err(QueryError::Cancelled)
    );
    assert_eq!(
        snap.count_cancellable(b"ab%", &token),
        Err(QueryError::Cancelled)
    );
}

#[test]
fn test_fresh_token_does_not_abort() {
    let snap = snapshot(&["abc", "bcd", "cde"]);
    let token = CancelToken::new();
    assert_eq!(snap.count_cancellable(b"%b%c%", &token), Ok(2));
}

#[test]
fn test_results_are_ascending_and_unique() {
    let snap = snapshot(&["aa", "ab", "aa", "ba", "aa"]);
    let result = ids(&snap, b"%a%");
    let mut sorted = result.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(result, sorted);
}

#[test]
fn test_count_agrees_with_rows() {
    let snap = snapshot(&["aa", "ab", "ba", "bb", "a"]);
    for pattern in [
        b"%".as_slice(),
        b"a%",
        b"%a",
        b"%a%",
        b"a%b",
        b"_",
        b"__",
        b"%a%b%",
        b"",
    ] {
        let count = snap.count(pattern).expect("count");
        let rows: RoaringBitmap = snap.matching(pattern).expect("rows");
        assert_eq!(count, rows.len(), "pattern {:?}", pattern);
    }
}

#[test]
fn test_benchmark_scenarios_against_naive() {
    // Miniature version of the benchmark profile: lowercase strings,
    // length 6..=10, the pattern shapes called out in acceptance.
    let corpus: Vec<String> = (0..400)
        .map(|i: u32| {
            let mut s = String::new();
            let len = 6 + (i as usize * 7) % 5;
            for k in 0..len {
                let byte = b'a' + ((i as usize * 31 + k * 17) % 26) as u8;
                s.push(char::from(byte));
            }
            s
        })
        .collect();
    let values: Vec<&str> = corpus.iter().map(String::as_str).collect();
    let snap = snapshot(&values);

    for pattern in [
        b"a%".as_slice(),
        b"%xyz",
        b"%a%",
        b"_a%",
        b"%a%b%c%",
        b"ab_d%",
        b"%q_z",
        b"______",
        b"___%",
    ] {
        assert_eq!(
            ids(&snap, pattern),
            naive(&snap, pattern),
            "pattern {:?}",
            pattern
        );
    }

    // "%a%" is exactly the char-anywhere set.
    let anywhere: Vec<u32> = snap.char_anywhere(b'a').iter().collect();
    assert_eq!(ids(&snap, b"%a%"), anywhere);
}
