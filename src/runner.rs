use crate::error::FlowError;
use crate::node::{DynOp, Node};
use crate::pipeline::Pipeline;
use crate::type_token::{concat_parts, Partition};
use crate::NodeId;
use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Clone, Copy, Debug)]
pub enum ExecMode {
    Sequential,
    Parallel { threads: Option<usize>, partitions: Option<usize> },
}

/// Executes the graph of nodes ending at a terminal node.
///
/// The whole pass runs to completion or fails once. `timeout`, when set, bounds
/// the pass and is reported as [`FlowError::Timeout`]. It is checked before every
/// element of a stateless stage, before each partition enters a barrier and
/// between stages. A single user function call or barrier merge is never
/// interrupted, so the overrun is bounded by the longest of those.
///
/// Linear runs of nodes execute as one chain. A multi-input node
/// ([`Node::Join`]) first runs each of its inputs as a chain of its own, then
/// acts as the source of the chain that follows it.
pub struct Runner {
    pub mode: ExecMode,
    pub default_partitions: usize,
    pub timeout: Option<Duration>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            mode: ExecMode::Sequential,
            default_partitions: 2 * num_cpus::get().max(2),
            timeout: None,
        }
    }
}

/// Time limit of one pass.
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub(crate) fn new(limit: Option<Duration>) -> Self {
        Self { started: Instant::now(), limit }
    }

    /// Fails with [`FlowError::Timeout`] once the limit has passed.
    #[inline]
    pub fn check(&self) -> Result<()> {
        if let Some(limit) = self.limit
            && self.started.elapsed() > limit
        {
            return Err(FlowError::Timeout(limit).into());
        }
        Ok(())
    }
}

type Graph = (HashMap<NodeId, Node>, Vec<(NodeId, NodeId)>);

impl Runner {
    pub fn run_collect<T: 'static + Send + Sync + Clone>(
        &self,
        p: &Pipeline,
        terminal: NodeId,
    ) -> Result<Vec<T>> {
        let deadline = Deadline::new(self.timeout);
        let graph = p.snapshot();

        let parts = match self.mode {
            ExecMode::Parallel { threads: Some(t), .. } => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(t)
                    .build()
                    .context("build rayon thread pool")?;
                pool.install(|| self.run_parts(&graph, terminal, &deadline))?
            }
            _ => self.run_parts(&graph, terminal, &deadline)?,
        };
        deadline.check()?;
        Ok(concat_parts::<T>(parts)?)
    }

    /// Run the chain ending at `terminal`; one `Vec` partition per output split.
    fn run_parts(&self, graph: &Graph, terminal: NodeId, deadline: &Deadline) -> Result<Vec<Partition>> {
        let chain = self.plan(graph, terminal, deadline)?;
        match self.mode {
            ExecMode::Sequential => Ok(vec![exec_seq(chain, deadline)?]),
            ExecMode::Parallel { partitions, .. } => {
                exec_parallel(chain, partitions.unwrap_or(self.default_partitions), deadline)
            }
        }
    }

    /// Backwalk terminal → … → source. A `Join` ends the walk: its inputs are
    /// executed here and its output becomes the chain's source.
    fn plan(&self, graph: &Graph, terminal: NodeId, deadline: &Deadline) -> Result<Vec<(NodeId, Node)>> {
        let (nodes, edges) = graph;
        let mut chain: Vec<(NodeId, Node)> = Vec::new();
        let mut cur = terminal;
        loop {
            let n = nodes
                .get(&cur)
                .cloned()
                .ok_or_else(|| anyhow!("missing node {cur:?}"))?;
            if let Node::Join { label, exec, vec_ops, elem_tag } = n {
                let inputs: Vec<NodeId> =
                    edges.iter().filter(|(_, to)| *to == cur).map(|(from, _)| *from).collect();
                debug!(node = cur.raw(), join = label, inputs = inputs.len(), "running join inputs");
                let materialized = inputs
                    .into_iter()
                    .map(|id| self.run_parts(graph, id, deadline))
                    .collect::<Result<Vec<_>>>()?;
                deadline.check()?;
                let payload: Arc<dyn Any + Send + Sync> = Arc::from(exec(materialized)?);
                chain.push((cur, Node::Source { payload, vec_ops, elem_tag }));
                break;
            }
            chain.push((cur, n));
            if let Some((from, _)) = edges.iter().find(|(_, to)| *to == cur).cloned() {
                cur = from;
            } else {
                break;
            }
        }
        chain.reverse();
        Ok(chain)
    }
}

/// Run a fused stateless stage
fn fuse_stateless(ops: &[Arc<dyn DynOp>], input: Partition, deadline: &Deadline) -> Result<Partition> {
    ops.iter().try_fold(input, |acc, op| op.apply(acc, deadline))
}

/// Sequential executor (single partition in-process)
fn exec_seq(plan: Vec<(NodeId, Node)>, deadline: &Deadline) -> Result<Partition> {
    let mut buf: Option<Partition> = None;

    for (id, node) in plan {
        deadline.check()?;
        debug!(node = id.raw(), kind = node.kind(), "sequential stage");
        buf = Some(match node {
            Node::Source { payload, vec_ops, elem_tag } => vec_ops
                .clone_any(payload.as_ref())
                .ok_or_else(|| anyhow!("source {id:?} does not hold Vec<{}>", elem_tag.name))?,
            Node::Stateless(ops) => fuse_stateless(&ops, take_input(&mut buf, id)?, deadline)?,
            Node::Keyed { local, merge, .. } => {
                let partial = local(take_input(&mut buf, id)?)?;
                deadline.check()?;
                merge(vec![partial])?
            }
            Node::Join { .. } => bail!("join {id:?} was not resolved into a source"),
        });
    }

    buf.ok_or_else(|| anyhow!("empty plan"))
}

fn take_input(buf: &mut Option<Partition>, id: NodeId) -> Result<Partition> {
    buf.take().ok_or_else(|| anyhow!("node {id:?} has no input"))
}

/// Parallel executor (partition source → fuse stateless per partition → barriers)
fn exec_parallel(plan: Vec<(NodeId, Node)>, partitions: usize, deadline: &Deadline) -> Result<Vec<Partition>> {
    let Some((_, Node::Source { payload, vec_ops, elem_tag })) = plan.first() else {
        bail!("plan must start with a Source node");
    };
    let rest = &plan[1..];

    let total_len = vec_ops.len(payload.as_ref()).unwrap_or(0);
    let parts = partitions.max(1).min(total_len.max(1));
    debug!(elements = total_len, partitions = parts, elem = elem_tag.name, "parallel source split");

    let mut current: Vec<Partition> = vec_ops
        .split(payload.as_ref(), parts)
        .ok_or_else(|| anyhow!("source does not hold Vec<{}>", elem_tag.name))?;

    let mut i = 0usize;
    while i < rest.len() {
        deadline.check()?;
        match &rest[i].1 {
            Node::Stateless(_) => {
                // Collect contiguous stateless nodes and fuse them
                let mut ops: Vec<Arc<dyn DynOp>> = Vec::new();
                while i < rest.len() {
                    if let Node::Stateless(more) = &rest[i].1 {
                        ops.extend(more.iter().cloned());
                        i += 1;
                    } else {
                        break;
                    }
                }
                debug!(ops = ops.len(), partitions = current.len(), "fused stateless stage");
                current = current
                    .into_par_iter()
                    .map(|chunk| fuse_stateless(&ops, chunk, deadline))
                    .collect::<Result<Vec<_>>>()?;
            }
            Node::Keyed { label, local, merge } => {
                debug!(barrier = *label, partitions = current.len(), "barrier");
                let locals = current
                    .into_par_iter()
                    .map(|chunk| {
                        deadline.check()?;
                        local(chunk)
                    })
                    .collect::<Result<Vec<_>>>()?;
                deadline.check()?;
                current = vec![merge(locals)?];
                i += 1;
            }
            Node::Source { .. } => bail!("unexpected additional source in plan"),
            Node::Join { .. } => bail!("join {:?} was not resolved into a source", rest[i].0),
        }
    }

    Ok(current)
}
