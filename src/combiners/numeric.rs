//! Configuration-selected combiner over `f64` values.
//!
//! [`NumericCombiner`] dispatches over a closed set of variants so a pipeline
//! can pick its reduction at construction time (see
//! [`PipelineConfig`](crate::config::PipelineConfig)).

use crate::collection::CombineFn;
use crate::combiners::custom::CombineFns;
use crate::combiners::statistical::mean_of;
use crate::error::{FlowError, FlowResult};
use ordered_float::OrderedFloat;

/// Custom numeric combiners buffer their inputs and reduce them at drain time.
pub type CustomNumeric = CombineFns<f64, Vec<f64>, f64>;

#[derive(Clone)]
pub enum NumericCombiner {
    Sum,
    Min,
    Mean,
    Custom(CustomNumeric),
}

/// Accumulator shared by all [`NumericCombiner`] variants.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericAcc {
    Sum(f64),
    Min(Option<f64>),
    Mean { sum: f64, count: u64 },
    Custom(Vec<f64>),
}

impl NumericAcc {
    fn variant(&self) -> &'static str {
        match self {
            NumericAcc::Sum(_) => "sum",
            NumericAcc::Min(_) => "min",
            NumericAcc::Mean { .. } => "mean",
            NumericAcc::Custom(_) => "custom",
        }
    }
}

impl NumericCombiner {
    pub fn name(&self) -> &'static str {
        match self {
            NumericCombiner::Sum => "sum",
            NumericCombiner::Min => "min",
            NumericCombiner::Mean => "mean",
            NumericCombiner::Custom(_) => "custom",
        }
    }
}

impl CombineFn<f64, NumericAcc, f64> for NumericCombiner {
    fn create(&self) -> NumericAcc {
        match self {
            NumericCombiner::Sum => NumericAcc::Sum(0.0),
            NumericCombiner::Min => NumericAcc::Min(None),
            NumericCombiner::Mean => NumericAcc::Mean { sum: 0.0, count: 0 },
            NumericCombiner::Custom(c) => NumericAcc::Custom(c.create()),
        }
    }

    fn add_input(&self, acc: &mut NumericAcc, v: f64) {
        match (self, acc) {
            (NumericCombiner::Sum, NumericAcc::Sum(s)) => *s += v,
            (NumericCombiner::Min, NumericAcc::Min(m)) => {
                *m = Some(match *m {
                    Some(cur) => OrderedFloat(cur).min(OrderedFloat(v)).0,
                    None => v,
                })
            }
            (NumericCombiner::Mean, NumericAcc::Mean { sum, count }) => {
                *sum += v;
                *count += 1;
            }
            (NumericCombiner::Custom(c), NumericAcc::Custom(buf)) => c.add_input(buf, v),
            // Accumulators only come from `create`, so the variants always line up.
            (comb, acc) => debug_assert!(false, "{} combiner fed a {} accumulator", comb.name(), acc.variant()),
        }
    }

    fn merge(&self, acc: &mut NumericAcc, other: NumericAcc) -> FlowResult<()> {
        match (self, acc, other) {
            (NumericCombiner::Sum, NumericAcc::Sum(a), NumericAcc::Sum(b)) => *a += b,
            (NumericCombiner::Min, NumericAcc::Min(a), NumericAcc::Min(b)) => {
                *a = match (*a, b) {
                    (Some(x), Some(y)) => Some(OrderedFloat(x).min(OrderedFloat(y)).0),
                    (x, y) => x.or(y),
                }
            }
            (
                NumericCombiner::Mean,
                NumericAcc::Mean { sum, count },
                NumericAcc::Mean { sum: s2, count: c2 },
            ) => {
                *sum += s2;
                *count += c2;
            }
            (NumericCombiner::Custom(c), NumericAcc::Custom(a), NumericAcc::Custom(b)) => c.merge(a, b)?,
            (comb, a, b) => {
                return Err(FlowError::invariant(format!(
                    "cannot merge {} and {} accumulators with the {} combiner",
                    a.variant(),
                    b.variant(),
                    comb.name()
                )));
            }
        }
        Ok(())
    }

    fn finish(&self, acc: &NumericAcc) -> f64 {
        match (self, acc) {
            (_, NumericAcc::Sum(s)) => *s,
            (_, NumericAcc::Min(m)) => m.unwrap_or(f64::INFINITY),
            (_, NumericAcc::Mean { sum, count }) => mean_of(*sum, *count),
            (NumericCombiner::Custom(c), NumericAcc::Custom(buf)) => c.finish(buf),
            (_, NumericAcc::Custom(_)) => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_accumulators_are_an_invariant_error() {
        let mut acc = NumericCombiner::Sum.create();
        let err = NumericCombiner::Sum
            .merge(&mut acc, NumericAcc::Mean { sum: 1.0, count: 1 })
            .unwrap_err();
        assert!(matches!(err, FlowError::Invariant(_)));
    }

    #[test]
    fn min_of_nothing_is_infinity() {
        let acc = NumericCombiner::Min.create();
        assert_eq!(NumericCombiner::Min.finish(&acc), f64::INFINITY);
    }

    #[test]
    fn custom_variant_uses_buffered_values() {
        let comb = NumericCombiner::Custom(CombineFns::from_values_fn(|vs: &[f64]| {
            vs.iter().copied().fold(1.0, |a, b| a * b)
        }));
        let mut acc = comb.create();
        for v in [2.0, 3.0, 5.0, 7.0] {
            comb.add_input(&mut acc, v);
        }
        assert_eq!(comb.finish(&acc), 210.0);
    }
}
