//! Testing utilities for windbeam pipelines.
//!
//! - [`TestPipeline`]: a `Pipeline` with graph introspection for tests.
//! - Assertions in [`assertions`]: ordered, multiset, key/value and
//!   `(key, window)` comparisons, float closeness, typed error checks, and
//!   [`assert_seq_par_agree`] to check both execution modes at once.
//!
//! ```no_run
//! use windbeam::*;
//! use windbeam::testing::*;
//!
//! #[test]
//! fn doubles() -> anyhow::Result<()> {
//!     let p = TestPipeline::new();
//!     let result = from_vec(&p, vec![1, 2, 3]).map(|x: &i32| x * 2).collect_seq()?;
//!     assert_collections_equal(&result, &[2, 4, 6]);
//!     Ok(())
//! }
//! ```

pub mod assertions;

pub use assertions::*;

use crate::Pipeline;
use std::ops::Deref;

/// A [`Pipeline`] for tests; dereferences to the pipeline it wraps.
#[derive(Clone, Default)]
pub struct TestPipeline {
    pipeline: Pipeline,
}

impl TestPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.pipeline.snapshot().0.len()
    }

    /// Number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.pipeline.snapshot().1.len()
    }

    /// Node kinds (`source`, `stateless` or a barrier label) in id order.
    #[must_use]
    pub fn node_kinds(&self) -> Vec<&'static str> {
        let (nodes, _) = self.pipeline.snapshot();
        let mut kinds: Vec<_> = nodes.iter().map(|(id, n)| (id.raw(), n.kind())).collect();
        kinds.sort_by_key(|(id, _)| *id);
        kinds.into_iter().map(|(_, k)| k).collect()
    }
}

impl Deref for TestPipeline {
    type Target = Pipeline;

    fn deref(&self) -> &Pipeline {
        &self.pipeline
    }
}
