//! Assertions for comparing pipeline outputs.
//!
//! Grouped and combined outputs come back in no particular order, so most
//! helpers here compare after sorting or as multisets.

use crate::error::FlowError;
use crate::{PCollection, RFBound, Window};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(a, e, "Collection mismatch at index {i}:\n  Expected: {expected:?}\n  Actual: {actual:?}");
    }
}

fn counts<T: Eq + Hash>(items: &[T]) -> HashMap<&T, usize> {
    let mut m = HashMap::new();
    for t in items {
        *m.entry(t).or_insert(0) += 1;
    }
    m
}

/// Assert that two collections hold the same elements with the same
/// multiplicities, in any order.
///
/// # Panics
///
/// Panics listing the missing and unexpected elements.
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    let a = counts(actual);
    let e = counts(expected);
    if a != e {
        let missing: Vec<_> = e.iter().filter(|(k, n)| a.get(*k) < Some(*n)).map(|(k, _)| *k).collect();
        let extra: Vec<_> = a.iter().filter(|(k, n)| e.get(*k) < Some(*n)).map(|(k, _)| *k).collect();
        panic!(
            "Collection content mismatch:\n  Missing: {missing:?}\n  Unexpected: {extra:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
    }
}

/// Assert that two key/value collections are equal after sorting by key.
///
/// # Panics
///
/// Panics if the sorted collections differ.
pub fn assert_kv_collections_equal<K, V>(mut actual: Vec<(K, V)>, mut expected: Vec<(K, V)>)
where
    K: Debug + Ord,
    V: Debug + PartialEq,
{
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_collections_equal(&actual, &expected);
}

/// Assert that two `(key, window, value)` collections are equal after sorting
/// by key, then window.
///
/// # Panics
///
/// Panics if the sorted collections differ.
pub fn assert_windowed_equal<K, V>(mut actual: Vec<(K, Window, V)>, mut expected: Vec<(K, Window, V)>)
where
    K: Debug + Ord,
    V: Debug + PartialEq,
{
    actual.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
    expected.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
    assert_collections_equal(&actual, &expected);
}

/// Assert `|actual - expected| <= eps`, treating two NaNs as equal.
///
/// # Panics
///
/// Panics if the values are further apart than `eps`.
pub fn assert_f64_near(actual: f64, expected: f64, eps: f64) {
    if actual.is_nan() && expected.is_nan() {
        return;
    }
    assert!((actual - expected).abs() <= eps, "expected {expected} ± {eps}, got {actual}");
}

/// Assert that `result` failed with a [`FlowError`] matching `pred`.
///
/// # Panics
///
/// Panics on success, on an error that is not a `FlowError`, or on a
/// `FlowError` rejected by `pred`.
pub fn assert_flow_error<T, E>(result: Result<T, E>, pred: impl Fn(&FlowError) -> bool)
where
    T: Debug,
    E: Into<anyhow::Error>,
{
    let result: anyhow::Result<T> = result.map_err(Into::into);
    match result {
        Ok(v) => panic!("expected a FlowError, got Ok({v:?})"),
        Err(e) => match e.downcast_ref::<FlowError>() {
            Some(fe) => assert!(pred(fe), "unexpected FlowError: {fe}"),
            None => panic!("expected a FlowError, got: {e:#}"),
        },
    }
}

/// Run `build` twice, once collected sequentially and once in parallel with
/// `partitions` partitions, assert that both give the same multiset, and
/// return the sequential result.
///
/// # Panics
///
/// Panics if the two runs disagree.
pub fn assert_seq_par_agree<T, F>(partitions: usize, build: F) -> anyhow::Result<Vec<T>>
where
    T: RFBound + Debug + Eq + Hash,
    F: Fn() -> PCollection<T>,
{
    let seq = build().collect_seq()?;
    let par = build().collect_par(Some(2), Some(partitions))?;
    assert_collections_unordered_equal(&par, &seq);
    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiset_comparison_counts_duplicates() {
        assert_collections_unordered_equal(&[1, 2, 2], &[2, 1, 2]);
        let r = std::panic::catch_unwind(|| assert_collections_unordered_equal(&[1, 1, 2], &[1, 2, 2]));
        assert!(r.is_err());
    }
}
