use crate::error::FlowResult;
use crate::node::{DynOp, LocalFn, MergeFn, Node};
use crate::node_id::NodeId;
use crate::pipeline::Pipeline;
use crate::runner::{Deadline, ExecMode, Runner};
use crate::type_token::{downcast_part, Partition};
use crate::windowing::WindowFn;
use anyhow::Result;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub trait RFBound: 'static + Send + Sync + Clone {}
impl<T> RFBound for T where T: 'static + Send + Sync + Clone {}

/// A deferred, immutable collection of `T` inside a [`Pipeline`].
///
/// Besides its node, a collection carries the windowing strategy set by the
/// last [`window_into`](PCollection::window_into); grouping transforms read it.
#[derive(Clone)]
pub struct PCollection<T> {
    pub(crate) pipeline: Pipeline,
    pub(crate) id: NodeId,
    pub(crate) windowing: WindowFn,
    pub(crate) _t: PhantomData<T>,
}

// ---- Stateless DynOps ----
struct MapOp<I, O, F>(F, PhantomData<fn(I) -> O>);
impl<I, O, F> DynOp for MapOp<I, O, F>
where
    I: RFBound,
    O: RFBound,
    F: Send + Sync + Fn(&I) -> O + 'static,
{
    fn apply(&self, input: Partition, deadline: &Deadline) -> Result<Partition> {
        let v = downcast_part::<Vec<I>>(input)?;
        let mut out: Vec<O> = Vec::with_capacity(v.len());
        for i in &v {
            deadline.check()?;
            out.push(self.0(i));
        }
        Ok(Box::new(out) as Partition)
    }
}
struct FilterOp<T, P>(P, PhantomData<fn(T)>);
impl<T,P> DynOp for FilterOp<T,P>
where T: RFBound, P: Send + Sync + Fn(&T)->bool + 'static
{
    fn apply(&self, input: Partition, deadline: &Deadline) -> Result<Partition> {
        let v = downcast_part::<Vec<T>>(input)?;
        let mut out: Vec<T> = Vec::new();
        for t in v {
            deadline.check()?;
            if self.0(&t) { out.push(t); }
        }
        Ok(Box::new(out))
    }
}
struct FlatMapOp<I,O,F>(F, PhantomData<fn(I) -> O>);
impl<I,O,F> DynOp for FlatMapOp<I,O,F>
where I: RFBound, O: RFBound, F: Send + Sync + Fn(&I)->Vec<O> + 'static
{
    fn apply(&self, input: Partition, deadline: &Deadline) -> Result<Partition> {
        let v = downcast_part::<Vec<I>>(input)?;
        let mut out: Vec<O> = Vec::new();
        for i in &v {
            deadline.check()?;
            out.extend(self.0(i));
        }
        Ok(Box::new(out))
    }
}

impl<T: RFBound> PCollection<T> {
    pub(crate) fn with_node<O>(self, node: Node) -> PCollection<O> {
        let id = self.pipeline.insert_node(node);
        self.pipeline.connect(self.id, id);
        PCollection { pipeline: self.pipeline, id, windowing: self.windowing, _t: PhantomData }
    }

    pub(crate) fn barrier<O>(self, label: &'static str, local: LocalFn, merge: MergeFn) -> PCollection<O> {
        self.with_node(Node::Keyed { label, local, merge })
    }

    pub fn map<O, F>(self, f: F) -> PCollection<O>
    where O: RFBound, F: 'static + Send + Sync + Fn(&T) -> O
    {
        let op: Arc<dyn DynOp> = Arc::new(MapOp::<T,O,F>(f, PhantomData));
        self.with_node(Node::Stateless(vec![op]))
    }

    pub fn filter<F>(self, pred: F) -> PCollection<T>
    where F: 'static + Send + Sync + Fn(&T) -> bool
    {
        let op: Arc<dyn DynOp> = Arc::new(FilterOp::<T,F>(pred, PhantomData));
        self.with_node(Node::Stateless(vec![op]))
    }

    pub fn flat_map<O, F>(self, f: F) -> PCollection<O>
    where O: RFBound, F: 'static + Send + Sync + Fn(&T) -> Vec<O>
    {
        let op: Arc<dyn DynOp> = Arc::new(FlatMapOp::<T,O,F>(f, PhantomData));
        self.with_node(Node::Stateless(vec![op]))
    }

    /// Set the windowing strategy used by later grouping transforms.
    pub fn window_into(mut self, windowing: WindowFn) -> PCollection<T> {
        self.windowing = windowing;
        self
    }

    pub fn windowing(&self) -> WindowFn {
        self.windowing
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn collect_seq(self) -> Result<Vec<T>> {
        let r = Runner { mode: ExecMode::Sequential, ..Default::default() };
        r.run_collect::<T>(&self.pipeline, self.id)
    }

    pub fn collect_par(self, threads: Option<usize>, partitions: Option<usize>) -> Result<Vec<T>> {
        let r = Runner { mode: ExecMode::Parallel { threads, partitions }, ..Default::default() };
        r.run_collect::<T>(&self.pipeline, self.id)
    }

    /// Execute with an explicitly configured [`Runner`].
    pub fn collect_with(self, runner: &Runner) -> Result<Vec<T>> {
        runner.run_collect::<T>(&self.pipeline, self.id)
    }

    /// Sequential collect that fails with `FlowError::Timeout` past `limit`.
    pub fn collect_seq_within(self, limit: Duration) -> Result<Vec<T>> {
        let r = Runner { mode: ExecMode::Sequential, timeout: Some(limit), ..Default::default() };
        r.run_collect::<T>(&self.pipeline, self.id)
    }
}

/// Combiner contract: an associative, commutative reduction over a mergeable
/// accumulator.
///
/// - `create` is called before the first `add_input` for a group.
/// - `merge` folds `other` into `acc`; it must be associative and commutative
///   so partial accumulators can be merged in any order.
/// - `finish` is called once per group when it is drained and only reads the
///   accumulator.
pub trait CombineFn<V, A, O>: Send + Sync + 'static {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: V);
    fn merge(&self, acc: &mut A, other: A) -> FlowResult<()>;
    fn finish(&self, acc: &A) -> O;

    /// Merge any number of accumulators; empty input yields `create()`.
    fn merge_accumulators(&self, accs: Vec<A>) -> FlowResult<A> {
        let mut it = accs.into_iter();
        let Some(mut acc) = it.next() else {
            return Ok(self.create());
        };
        for other in it {
            self.merge(&mut acc, other)?;
        }
        Ok(acc)
    }
}

/// Combiners that can build an accumulator straight from a whole group,
/// used by `combine_values_lifted` after `group_by_key`.
pub trait LiftableCombiner<V, A, O>: CombineFn<V, A, O> {
    fn build_from_group(&self, values: &[V]) -> A;
}
