//! In-memory sources.
//!
//! - [`from_vec`] -- turns a `Vec<T>` into a root `PCollection<T>`.
//! - [`from_iter`] -- same for any `IntoIterator<Item = T>`.
//!
//! Both insert a [`Node::Source`] holding the vector behind an `Arc` together
//! with the `VecOps` the runner needs to split it into partitions. New sources
//! start in the global window; call
//! [`window_into`](PCollection::window_into) to change that.
//!
//! ```
//! use windbeam::*;
//!
//! let p = Pipeline::default();
//! let squared = from_iter(&p, 1..=5).map(|n: &i32| n * n);
//! assert_eq!(squared.collect_seq()?, vec![1, 4, 9, 16, 25]);
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::node::Node;
use crate::type_token::{vec_ops_for, TypeTag};
use crate::windowing::WindowFn;
use crate::{PCollection, Pipeline, RFBound};
use std::marker::PhantomData;
use std::sync::Arc;

/// Create a root [`PCollection<T>`] from a vector.
pub fn from_vec<T>(p: &Pipeline, data: Vec<T>) -> PCollection<T>
where
    T: RFBound,
{
    let id = p.insert_node(Node::Source {
        payload: Arc::new(data),
        vec_ops: vec_ops_for::<T>(),
        elem_tag: TypeTag::of::<T>(),
    });
    PCollection { pipeline: p.clone(), id, windowing: WindowFn::Global, _t: PhantomData }
}

/// Create a root [`PCollection<T>`] from anything iterable.
pub fn from_iter<T, I>(p: &Pipeline, iter: I) -> PCollection<T>
where
    T: RFBound,
    I: IntoIterator<Item = T>,
{
    from_vec(p, iter.into_iter().collect::<Vec<T>>())
}
