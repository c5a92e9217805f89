//! Built-in combiners for `combine_values`, `combine_per_key_and_window`,
//! `combine_globally` and `combine_values_lifted`.
//!
//! Every combiner implements [`CombineFn`](crate::CombineFn):
//!
//! - [`Sum<T>`] -- sum of values.
//! - [`Min<T>`] / [`Max<T>`] -- minimum / maximum value (`Option<T>` output).
//! - [`Mean`] -- arithmetic mean as `f64`; NaN for an empty accumulator.
//! - [`Count`] -- number of values.
//! - [`ToList<T>`] -- every value, in arrival order (backs `group_by_key`).
//! - [`CombineFns`] -- a user combiner assembled from closures.
//! - [`NumericCombiner`] -- `Sum | Min | Mean | Custom` chosen at construction time.
//!
//! # Examples
//! ```
//! use windbeam::*;
//!
//! let p = Pipeline::default();
//! let mut per_player = from_vec(&p, vec![("cat", 1u32), ("cat", 5), ("dog", 2)])
//!     .combine_values(Mean)
//!     .collect_seq()?;
//! per_player.sort_by(|a, b| a.0.cmp(b.0));
//! assert_eq!(per_player, vec![("cat", 3.0), ("dog", 2.0)]);
//!
//! let total = from_vec(&p, vec![1u64, 2, 3])
//!     .combine_globally(Sum::<u64>::new())
//!     .collect_seq()?;
//! assert_eq!(total, vec![6]);
//! # anyhow::Result::<()>::Ok(())
//! ```

mod basic;
mod custom;
mod numeric;
mod statistical;

pub use basic::{Count, Max, Min, Sum, ToList};
pub use custom::CombineFns;
pub use numeric::{CustomNumeric, NumericAcc, NumericCombiner};
pub use statistical::Mean;
