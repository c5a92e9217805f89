use crate::runner::Deadline;
use crate::type_token::{Partition, TypeTag, VecOps};
use anyhow::Result;
use std::any::Any;
use std::sync::Arc;

/// An element-wise operation over one partition.
///
/// Implementations check `deadline` before each element.
pub trait DynOp: Send + Sync {
    fn apply(&self, input: Partition, deadline: &Deadline) -> Result<Partition>;
}

/// Per-partition half of a barrier: turns a partition into partial state.
pub type LocalFn = Arc<dyn Fn(Partition) -> Result<Partition> + Send + Sync>;

/// Cross-partition half of a barrier: merges partial states into the output `Vec`.
pub type MergeFn = Arc<dyn Fn(Vec<Partition>) -> Result<Partition> + Send + Sync>;

/// Body of a multi-input node: receives every partition of every input, in
/// input order, and returns the output `Vec`.
pub type JoinFn = Arc<dyn Fn(Vec<Vec<Partition>>) -> Result<Partition> + Send + Sync>;

#[derive(Clone)]
pub enum Node {
    Source {
        payload: Arc<dyn Any + Send + Sync>,
        vec_ops: Arc<dyn VecOps>,
        elem_tag: TypeTag,
    },
    Stateless(Vec<Arc<dyn DynOp>>),

    /// Grouping / combining barrier.
    /// - `local`: consumes one partition, returns partial state (a grouping engine or accumulator)
    /// - `merge`: merges all partial states and materializes `Vec<Out>`
    Keyed {
        label: &'static str,
        local: LocalFn,
        merge: MergeFn,
    },

    /// Multi-input barrier (flatten, co-group). Its inputs are the sources of
    /// its incoming edges, in the order they were connected. Each input runs to
    /// completion first; the output then feeds the rest of the chain like a
    /// source, split with `vec_ops`.
    Join {
        label: &'static str,
        exec: JoinFn,
        vec_ops: Arc<dyn VecOps>,
        elem_tag: TypeTag,
    },
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Source { .. } => "source",
            Node::Stateless(_) => "stateless",
            Node::Keyed { label, .. } | Node::Join { label, .. } => *label,
        }
    }
}
