//! Multi-input transforms: [`flatten`] and [`PCollection::co_group_by_key`].
//!
//! Both insert a [`Node::Join`] whose incoming edges are connected in input
//! order. The runner executes every input chain to completion, then hands the
//! materialized partitions to the node's body.

use crate::error::{FlowError, FlowResult};
use crate::node::{JoinFn, Node};
use crate::type_token::{concat_parts, vec_ops_for, Partition, TypeTag};
use crate::{NodeId, PCollection, Pipeline, RFBound, WindowFn};
use anyhow::Result;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

fn insert_join<O: RFBound>(
    p: &Pipeline,
    label: &'static str,
    inputs: &[NodeId],
    windowing: WindowFn,
    exec: JoinFn,
) -> PCollection<O> {
    let id = p.insert_node(Node::Join { label, exec, vec_ops: vec_ops_for::<O>(), elem_tag: TypeTag::of::<O>() });
    for &input in inputs {
        p.connect(input, id);
    }
    PCollection { pipeline: p.clone(), id, windowing, _t: PhantomData }
}

fn same_graph(a: &Pipeline, b: &Pipeline) -> bool {
    Arc::ptr_eq(&a.inner, &b.inner)
}

/// Merge collections of the same type into one.
///
/// The result holds every element of every input: all of the first input, in
/// its order, then all of the second, and so on. Inputs must belong to the same
/// pipeline and share a window function, which the result keeps.
///
/// ```
/// use windbeam::*;
///
/// let p = Pipeline::default();
/// let a = from_vec(&p, vec!["a", "b"]);
/// let b = from_vec(&p, vec!["c"]);
/// assert_eq!(flatten(&[a, b])?.collect_seq()?, vec!["a", "b", "c"]);
/// # anyhow::Result::<()>::Ok(())
/// ```
pub fn flatten<T: RFBound>(inputs: &[PCollection<T>]) -> FlowResult<PCollection<T>> {
    let Some(first) = inputs.first() else {
        return Err(FlowError::invariant("flatten needs at least one input"));
    };
    for other in &inputs[1..] {
        if !same_graph(&first.pipeline, &other.pipeline) {
            return Err(FlowError::invariant("flatten inputs belong to different pipelines"));
        }
        if other.windowing != first.windowing {
            return Err(FlowError::window_spec(format!(
                "flatten inputs disagree on windowing: {:?} vs {:?}",
                first.windowing, other.windowing
            )));
        }
    }

    let exec: JoinFn = Arc::new(|inputs: Vec<Vec<Partition>>| -> Result<Partition> {
        let mut out: Vec<T> = Vec::new();
        for parts in inputs {
            out.extend(concat_parts::<T>(parts)?);
        }
        Ok(Box::new(out) as Partition)
    });
    let ids: Vec<_> = inputs.iter().map(|c| c.id).collect();
    Ok(insert_join(&first.pipeline, "flatten", &ids, first.windowing, exec))
}

/// Values of one key from both sides of a co-group, in arrival order.
pub type CoGrouped<V, W> = (Vec<V>, Vec<W>);

impl<K, V> PCollection<(K, V)>
where
    K: RFBound + Eq + Hash,
    V: RFBound,
{
    /// Group two keyed collections by key at once.
    ///
    /// Every key present on either side appears exactly once, with all of its
    /// values from `self` and all of its values from `other`; a side without
    /// the key contributes an empty list. Keys come out in first-seen order,
    /// scanning `self` before `other`. Windowing is ignored and the result is
    /// in the global window. Both sides must belong to the same pipeline.
    pub fn co_group_by_key<W: RFBound>(
        self,
        other: PCollection<(K, W)>,
    ) -> FlowResult<PCollection<(K, CoGrouped<V, W>)>> {
        if !same_graph(&self.pipeline, &other.pipeline) {
            return Err(FlowError::invariant("co_group_by_key inputs belong to different pipelines"));
        }
        let exec: JoinFn = Arc::new(|mut inputs: Vec<Vec<Partition>>| -> Result<Partition> {
            let (Some(right), Some(left), true) = (inputs.pop(), inputs.pop(), inputs.is_empty()) else {
                return Err(FlowError::invariant("co_group_by_key expects exactly two inputs").into());
            };
            let mut index: HashMap<K, usize> = HashMap::new();
            let mut out: Vec<(K, CoGrouped<V, W>)> = Vec::new();
            let mut slot = |k: K, out: &mut Vec<(K, CoGrouped<V, W>)>| {
                *index.entry(k.clone()).or_insert_with(|| {
                    out.push((k, (Vec::new(), Vec::new())));
                    out.len() - 1
                })
            };
            for (k, v) in concat_parts::<(K, V)>(left)? {
                let i = slot(k, &mut out);
                out[i].1.0.push(v);
            }
            for (k, w) in concat_parts::<(K, W)>(right)? {
                let i = slot(k, &mut out);
                out[i].1.1.push(w);
            }
            Ok(Box::new(out) as Partition)
        });

        Ok(insert_join(&self.pipeline, "co_group_by_key", &[self.id, other.id], WindowFn::Global, exec))
    }
}
