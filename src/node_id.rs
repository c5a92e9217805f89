//! Identifier for nodes within a [`Pipeline`](crate::pipeline::Pipeline).
//!
//! Every node inserted into the graph gets the next sequential `NodeId`. Only
//! the runner inspects them; they are `Copy` and hashable so they work as map keys
//! when snapshotting the graph.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}
