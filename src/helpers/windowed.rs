//! Keyed grouping and combining, windowed and global.
//!
//! Every transform here is a single `Keyed` barrier backed by a
//! [`GroupingEngine`]: the per-partition half feeds rows into a fresh engine,
//! the cross-partition half absorbs the partial engines into one and drains it.
//!
//! - On `(K, Timestamped<V>)`, the collection's [`WindowFn`](crate::WindowFn)
//!   assigns windows from each element's timestamp:
//!   [`group_by_key_and_window`](PCollection::group_by_key_and_window) and
//!   [`combine_per_key_and_window`](PCollection::combine_per_key_and_window)
//!   emit `(K, Window, _)`.
//! - On `(K, V)`, everything lands in the global window:
//!   [`group_by_key`](PCollection::group_by_key) and
//!   [`combine_values`](PCollection::combine_values) emit `(K, _)`.
//! - On `(K, Vec<V>)` (the output of `group_by_key`),
//!   [`combine_values_grouped`](PCollection::combine_values_grouped) and
//!   [`combine_values_lifted`](PCollection::combine_values_lifted) reduce each group.
//!
//! ```
//! use windbeam::*;
//!
//! let p = Pipeline::default();
//! let mut per_minute = from_vec(&p, vec![
//!     ("k", Timestamped::new(10, 50u32)),
//!     ("k", Timestamped::new(20, 60)),
//!     ("k", Timestamped::new(70, 5)),
//! ])
//! .window_into(WindowFn::fixed(60)?)
//! .combine_per_key_and_window(Sum::<u32>::new())
//! .collect_seq()?;
//! per_minute.sort_by_key(|(_, w, _)| *w);
//! assert_eq!(per_minute, vec![("k", Window::new(0, 60), 110), ("k", Window::new(60, 120), 5)]);
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::collection::{CombineFn, LiftableCombiner};
use crate::combiners::ToList;
use crate::grouping::GroupingEngine;
use crate::node::{LocalFn, MergeFn};
use crate::type_token::{downcast_part, Partition};
use crate::{PCollection, RFBound, Timestamped, Window};
use anyhow::Result;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

type Engine<K, V, A, O, C> = GroupingEngine<K, V, A, O, C>;

/// Cross-partition half shared by every keyed barrier: absorb all partial
/// engines into the first one, drain it and shape each bucket with `emit`.
fn drain_merge<K, V, A, O, C, Out, E>(label: &'static str, emit: E) -> MergeFn
where
    K: RFBound + Eq + Hash,
    V: 'static,
    A: Send + Sync + 'static,
    O: 'static,
    C: CombineFn<V, A, O>,
    Out: RFBound,
    E: Fn(K, Window, O) -> Out + Send + Sync + 'static,
{
    Arc::new(move |parts: Vec<Partition>| -> Result<Partition> {
        let partials = parts.len();
        let mut it = parts.into_iter();
        let Some(first) = it.next() else {
            return Ok(Box::new(Vec::<Out>::new()) as Partition);
        };
        let mut engine = downcast_part::<Engine<K, V, A, O, C>>(first)?;
        for p in it {
            engine.absorb(downcast_part::<Engine<K, V, A, O, C>>(p)?)?;
        }
        debug!(barrier = label, partials, buckets = engine.len(), "draining grouping engine");
        let out: Vec<Out> = engine.drain()?.into_iter().map(|(k, w, o)| emit(k, w, o)).collect();
        Ok(Box::new(out) as Partition)
    })
}

impl<K, V> PCollection<(K, Timestamped<V>)>
where
    K: RFBound + Eq + Hash,
    V: RFBound,
{
    /// Combine values per `(key, window)` with the collection's window function.
    ///
    /// Session windows of the same key that overlap or touch are merged before
    /// their accumulators are finished.
    pub fn combine_per_key_and_window<C, A, O>(self, comb: C) -> PCollection<(K, Window, O)>
    where
        C: CombineFn<V, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
    {
        let windowing = self.windowing;
        let comb = Arc::new(comb);
        let local: LocalFn = Arc::new(move |p: Partition| -> Result<Partition> {
            let rows = downcast_part::<Vec<(K, Timestamped<V>)>>(p)?;
            let mut engine = Engine::<K, V, A, O, C>::new(Arc::clone(&comb), windowing.is_merging());
            for (k, ev) in rows {
                let windows = windowing.assign(ev.ts);
                let Some((last, rest)) = windows.split_last() else { continue };
                for w in rest {
                    engine.add(k.clone(), *w, ev.value.clone())?;
                }
                engine.add(k, *last, ev.value)?;
            }
            Ok(Box::new(engine) as Partition)
        });
        let merge = drain_merge::<K, V, A, O, C, _, _>("combine_per_key_and_window", |k, w, o| (k, w, o));
        self.barrier("combine_per_key_and_window", local, merge)
    }

    /// Group values per `(key, window)`: `(K, Timestamped<V>) -> (K, Window, Vec<V>)`.
    pub fn group_by_key_and_window(self) -> PCollection<(K, Window, Vec<V>)> {
        self.combine_per_key_and_window(ToList::<V>::new())
    }
}

impl<K: RFBound + Eq + Hash, V: RFBound> PCollection<(K, V)> {
    /// Combine all values of each key with a [`CombineFn`].
    pub fn combine_values<C, A, O>(self, comb: C) -> PCollection<(K, O)>
    where
        C: CombineFn<V, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
    {
        let comb = Arc::new(comb);
        let local: LocalFn = Arc::new(move |p: Partition| -> Result<Partition> {
            let rows = downcast_part::<Vec<(K, V)>>(p)?;
            let mut engine = Engine::<K, V, A, O, C>::new(Arc::clone(&comb), false);
            for (k, v) in rows {
                engine.add(k, Window::global(), v)?;
            }
            Ok(Box::new(engine) as Partition)
        });
        let merge = drain_merge::<K, V, A, O, C, _, _>("combine_values", |k, _, o| (k, o));
        self.barrier("combine_values", local, merge)
    }

    /// Group values by key: (K, V) -> (K, Vec<V>)
    pub fn group_by_key(self) -> PCollection<(K, Vec<V>)> {
        self.combine_values(ToList::<V>::new())
    }
}

impl<K, V> PCollection<(K, Vec<V>)>
where
    K: RFBound + Eq + Hash,
    V: RFBound,
{
    /// Reduce each already-grouped value list with any [`CombineFn`].
    pub fn combine_values_grouped<C, A, O>(self, comb: C) -> PCollection<(K, O)>
    where
        C: CombineFn<V, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
    {
        self.combine_groups("combine_values_grouped", comb, |c: &C, vs: Vec<V>| {
            let mut acc = c.create();
            for v in vs {
                c.add_input(&mut acc, v);
            }
            acc
        })
    }

    /// Like [`combine_values_grouped`](Self::combine_values_grouped), but builds each
    /// accumulator from the whole group slice in one call.
    pub fn combine_values_lifted<C, A, O>(self, comb: C) -> PCollection<(K, O)>
    where
        C: LiftableCombiner<V, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
    {
        self.combine_groups("combine_values_lifted", comb, |c: &C, vs: Vec<V>| c.build_from_group(&vs))
    }

    fn combine_groups<C, A, O, B>(self, label: &'static str, comb: C, build: B) -> PCollection<(K, O)>
    where
        C: CombineFn<V, A, O>,
        A: Send + Sync + 'static,
        O: RFBound,
        B: Fn(&C, Vec<V>) -> A + Send + Sync + 'static,
    {
        let comb = Arc::new(comb);
        let local: LocalFn = Arc::new(move |p: Partition| -> Result<Partition> {
            let groups = downcast_part::<Vec<(K, Vec<V>)>>(p)?;
            let mut engine = Engine::<K, V, A, O, C>::new(Arc::clone(&comb), false);
            for (k, vs) in groups {
                let acc = build(comb.as_ref(), vs);
                engine.add_accumulator(k, Window::global(), acc)?;
            }
            Ok(Box::new(engine) as Partition)
        });
        let merge = drain_merge::<K, V, A, O, C, _, _>(label, |k, _, o| (k, o));
        self.barrier(label, local, merge)
    }
}
