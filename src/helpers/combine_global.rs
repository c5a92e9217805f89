//! Global (non-keyed) combining.
//!
//! [`combine_globally`](PCollection::combine_globally) folds every element into
//! one output. Each partition builds one accumulator; the barrier merges them
//! with [`CombineFn::merge_accumulators`] and finishes the result once.
//!
//! The output holds exactly one element, even for an empty input, where it is
//! `finish(create())`.

use crate::collection::CombineFn;
use crate::node::{LocalFn, MergeFn};
use crate::type_token::{downcast_part, Partition};
use crate::{PCollection, RFBound};
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

impl<T: RFBound> PCollection<T> {
    /// Combine all elements into a single output using a [`CombineFn`].
    ///
    /// ```
    /// use windbeam::*;
    ///
    /// let p = Pipeline::default();
    /// let out = from_vec(&p, vec![1u64, 2, 3, 4])
    ///     .combine_globally(Sum::<u64>::new())
    ///     .collect_seq()?;
    /// assert_eq!(out, vec![10u64]);
    /// # anyhow::Result::<()>::Ok(())
    /// ```
    pub fn combine_globally<C, A, O>(self, comb: C) -> PCollection<O>
    where
        C: CombineFn<T, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
    {
        let comb = Arc::new(comb);

        // local: Vec<T> -> A
        let local: LocalFn = {
            let comb = Arc::clone(&comb);
            Arc::new(move |p: Partition| -> Result<Partition> {
                let rows = downcast_part::<Vec<T>>(p)?;
                let mut acc = comb.create();
                for v in rows {
                    comb.add_input(&mut acc, v);
                }
                Ok(Box::new(acc) as Partition)
            })
        };

        // merge: Vec<A> -> vec![O]
        let merge: MergeFn = Arc::new(move |parts: Vec<Partition>| -> Result<Partition> {
            let accs = parts
                .into_iter()
                .map(downcast_part::<A>)
                .collect::<Result<Vec<A>, _>>()?;
            debug!(partials = accs.len(), "combine_globally merge");
            let acc = comb.merge_accumulators(accs)?;
            Ok(Box::new(vec![comb.finish(&acc)]) as Partition)
        });

        self.barrier("combine_globally", local, merge)
    }
}
