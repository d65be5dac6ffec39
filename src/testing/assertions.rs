//! Assertion functions for decoded record streams.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
///
/// # Example
///
/// ```
/// use ironstream::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 3], &[1, 2, 3]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two collections contain the same elements, ignoring order.
///
/// Elements are counted, so `[a, a, b]` and `[a, b, b]` differ.
///
/// # Panics
///
/// Panics if the collections differ in content (ignoring order).
///
/// # Example
///
/// ```
/// use ironstream::testing::assert_collections_unordered_equal;
///
/// assert_collections_unordered_equal(&[3, 1, 2], &[1, 2, 3]);
/// ```
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    let actual_counts = counts(actual);
    let expected_counts = counts(expected);
    if actual_counts != expected_counts {
        let missing: Vec<_> = expected_counts
            .iter()
            .filter(|&(e, n)| actual_counts.get(e).copied().unwrap_or(0) < *n)
            .map(|(e, _)| e)
            .collect();
        let extra: Vec<_> = actual_counts
            .iter()
            .filter(|&(a, n)| expected_counts.get(a).copied().unwrap_or(0) < *n)
            .map(|(a, _)| a)
            .collect();

        panic!(
            "Collection content mismatch:\n  Missing elements: {missing:?}\n  Extra elements: {extra:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}

fn counts<T: Eq + Hash>(items: &[T]) -> HashMap<&T, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

/// Assert that `sequence` appears in `actual` in the same relative order,
/// possibly interleaved with other elements.
///
/// Parallel runs interleave files arbitrarily but keep each file's records in
/// order; this checks the latter.
///
/// # Panics
///
/// Panics if an element of `sequence` is missing or out of order.
///
/// # Example
///
/// ```
/// use ironstream::testing::assert_subsequence;
///
/// assert_subsequence(&[1, 10, 2, 20, 3], &[1, 2, 3]);
/// ```
pub fn assert_subsequence<T: Debug + PartialEq>(actual: &[T], sequence: &[T]) {
    let mut rest = actual.iter();
    for (i, wanted) in sequence.iter().enumerate() {
        assert!(
            rest.any(|a| a == wanted),
            "Subsequence element {i} missing or out of order:\n  Element: {wanted:?}\n  Sequence: {sequence:?}\n  Actual: {actual:?}"
        );
    }
}
