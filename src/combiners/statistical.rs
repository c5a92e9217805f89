//! Statistical combiners: `Mean`

use crate::collection::{CombineFn, LiftableCombiner};
use crate::error::FlowResult;
use crate::RFBound;

/* ===================== Mean ===================== */

/// Arithmetic mean of values per key as `f64`.
///
/// Values must be convertible into `f64` via `Into<f64>`.
///
/// - Accumulator: `(sum, count)`
/// - Output: `f64`
///
/// A zero-count accumulator yields `f64::NAN`; callers check with `is_nan()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mean;

impl<V> CombineFn<V, (f64, u64), f64> for Mean
where
    V: RFBound + Into<f64>,
{
    fn create(&self) -> (f64, u64) {
        (0.0, 0)
    }

    fn add_input(&self, acc: &mut (f64, u64), v: V) {
        acc.0 += v.into();
        acc.1 += 1;
    }

    fn merge(&self, acc: &mut (f64, u64), other: (f64, u64)) -> FlowResult<()> {
        acc.0 += other.0;
        acc.1 += other.1;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self, acc: &(f64, u64)) -> f64 {
        mean_of(acc.0, acc.1)
    }
}

impl<V> LiftableCombiner<V, (f64, u64), f64> for Mean
where
    V: RFBound + Into<f64>,
{
    fn build_from_group(&self, values: &[V]) -> (f64, u64) {
        let sum: f64 = values.iter().map(|v| v.clone().into()).sum();
        (sum, values.len() as u64)
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean_of(sum: f64, count: u64) -> f64 {
    if count == 0 { f64::NAN } else { sum / count as f64 }
}
