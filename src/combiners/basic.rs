//! Basic combiners: Sum, Min, Max, Count, ToList

use crate::collection::{CombineFn, LiftableCombiner};
use crate::error::FlowResult;
use crate::RFBound;
use std::cmp::Ord;
use std::marker::PhantomData;
use std::mem::take;
use std::ops::Add;

/* ===================== Sum<T> ===================== */

/// Sum of values per key.
///
/// - Accumulator: `T`
/// - Output: `T`
///
/// Requires `T: Add<Output=T> + Default`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T>(pub PhantomData<T>);
impl<T> Sum<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> CombineFn<T, T, T> for Sum<T>
where
    T: RFBound + Add<Output = T> + Default,
{
    fn create(&self) -> T {
        T::default()
    }

    fn add_input(&self, acc: &mut T, v: T) {
        *acc = take(acc) + v;
    }

    fn merge(&self, acc: &mut T, other: T) -> FlowResult<()> {
        *acc = take(acc) + other;
        Ok(())
    }

    fn finish(&self, acc: &T) -> T {
        acc.clone()
    }
}

impl<T> LiftableCombiner<T, T, T> for Sum<T>
where
    T: RFBound + Add<Output = T> + Default,
{
    fn build_from_group(&self, values: &[T]) -> T {
        values.iter().cloned().fold(T::default(), |a, v| a + v)
    }
}

/* ===================== Min<T> ===================== */

/// Minimum value per key (requires `Ord`).
///
/// - Accumulator: `Option<T>`
/// - Output: `Option<T>`; `None` only when nothing was added, which can
///   happen for `combine_globally` over an empty collection.
///
/// Floats can be combined through `ordered_float::OrderedFloat`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Min<T>(pub PhantomData<T>);
impl<T> Min<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> CombineFn<T, Option<T>, Option<T>> for Min<T>
where
    T: RFBound + Ord,
{
    fn create(&self) -> Option<T> {
        None
    }

    fn add_input(&self, acc: &mut Option<T>, v: T) {
        match acc {
            Some(cur) => {
                if v < *cur {
                    *cur = v
                }
            }
            None => *acc = Some(v),
        }
    }

    fn merge(&self, acc: &mut Option<T>, other: Option<T>) -> FlowResult<()> {
        if let Some(b) = other {
            self.add_input(acc, b);
        }
        Ok(())
    }

    fn finish(&self, acc: &Option<T>) -> Option<T> {
        acc.clone()
    }
}

impl<T> LiftableCombiner<T, Option<T>, Option<T>> for Min<T>
where
    T: RFBound + Ord,
{
    fn build_from_group(&self, values: &[T]) -> Option<T> {
        values.iter().min().cloned()
    }
}

/* ===================== Max<T> ===================== */

/// Maximum value per key (requires `Ord`).
///
/// - Accumulator: `Option<T>`
/// - Output: `Option<T>`
#[derive(Clone, Copy, Debug, Default)]
pub struct Max<T>(pub PhantomData<T>);
impl<T> Max<T> {
    /// Convenience constructor (same as `Default`).
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> CombineFn<T, Option<T>, Option<T>> for Max<T>
where
    T: RFBound + Ord,
{
    fn create(&self) -> Option<T> {
        None
    }

    fn add_input(&self, acc: &mut Option<T>, v: T) {
        match acc {
            Some(cur) => {
                if v > *cur {
                    *cur = v
                }
            }
            None => *acc = Some(v),
        }
    }

    fn merge(&self, acc: &mut Option<T>, other: Option<T>) -> FlowResult<()> {
        if let Some(b) = other {
            self.add_input(acc, b);
        }
        Ok(())
    }

    fn finish(&self, acc: &Option<T>) -> Option<T> {
        acc.clone()
    }
}

impl<T> LiftableCombiner<T, Option<T>, Option<T>> for Max<T>
where
    T: RFBound + Ord,
{
    fn build_from_group(&self, values: &[T]) -> Option<T> {
        values.iter().max().cloned()
    }
}

/* ===================== Count ===================== */

/// Number of values per key.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl<V> CombineFn<V, u64, u64> for Count
where
    V: RFBound,
{
    fn create(&self) -> u64 {
        0
    }

    fn add_input(&self, acc: &mut u64, _v: V) {
        *acc += 1;
    }

    fn merge(&self, acc: &mut u64, other: u64) -> FlowResult<()> {
        *acc += other;
        Ok(())
    }

    fn finish(&self, acc: &u64) -> u64 {
        *acc
    }
}

impl<V: RFBound> LiftableCombiner<V, u64, u64> for Count {
    fn build_from_group(&self, values: &[V]) -> u64 {
        values.len() as u64
    }
}

/* ===================== ToList<T> ===================== */

/// Buffers every value in arrival order; the accumulator behind `group_by_key`.
///
/// Merging appends `other` after `acc`, so the merged order depends on merge
/// order. Compare grouped values as multisets.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToList<T>(pub PhantomData<T>);
impl<T> ToList<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: RFBound> CombineFn<T, Vec<T>, Vec<T>> for ToList<T> {
    fn create(&self) -> Vec<T> {
        Vec::new()
    }

    fn add_input(&self, acc: &mut Vec<T>, v: T) {
        acc.push(v);
    }

    fn merge(&self, acc: &mut Vec<T>, mut other: Vec<T>) -> FlowResult<()> {
        acc.append(&mut other);
        Ok(())
    }

    fn finish(&self, acc: &Vec<T>) -> Vec<T> {
        acc.clone()
    }
}
