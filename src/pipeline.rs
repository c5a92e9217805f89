use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::io::coder::CoderRegistry;
use crate::node::Node;
use crate::node_id::NodeId;

/// Container for a deferred computation graph.
///
/// Cloning a `Pipeline` yields another handle to the same graph. The coder
/// registry is fixed when the pipeline is built and read-only afterwards.
pub struct Pipeline {
    pub(crate) inner: Arc<Mutex<PipelineInner>>,
    pub(crate) registry: Arc<CoderRegistry>,
}

pub struct PipelineInner {
    pub next_id: u64,
    pub nodes: HashMap<NodeId, Node>,
    pub edges: Vec<(NodeId, NodeId)>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::with_registry(CoderRegistry::default())
    }
}

/// Allow `Pipeline` cloning.
impl Clone for Pipeline {
    fn clone(&self) -> Self {
        Pipeline { inner: Arc::clone(&self.inner), registry: Arc::clone(&self.registry) }
    }
}

impl Pipeline {
    /// Build a pipeline around an explicit coder registry.
    pub fn with_registry(registry: CoderRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PipelineInner {
                next_id: 0,
                nodes: HashMap::new(),
                edges: Vec::new(),
            })),
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &CoderRegistry {
        &self.registry
    }

    // A panic while holding the lock cannot leave the graph half-written:
    // every mutation below is a single insert or push.
    fn graph(&self) -> MutexGuard<'_, PipelineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_node(&self, node: Node) -> NodeId {
        let mut g = self.graph();
        let id = NodeId::new(g.next_id);
        g.next_id += 1;
        g.nodes.insert(id, node);
        id
    }

    pub(crate) fn connect(&self, from: NodeId, to: NodeId) {
        self.graph().edges.push((from, to));
    }

    /// Clone of the node map and edge list.
    pub fn snapshot(&self) -> (HashMap<NodeId, Node>, Vec<(NodeId, NodeId)>) {
        let g = self.graph();
        (g.nodes.clone(), g.edges.clone())
    }
}
