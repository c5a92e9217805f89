//! Type tags and type-erased vector helpers.
//!
//! The runner moves data between nodes as opaque [`Partition`] boxes. Sources
//! keep their payload behind `Arc<dyn Any>` and carry a [`VecOps`] so the runner
//! can count, split and clone the payload without knowing the element type.

use crate::error::FlowError;
use std::any::{type_name, Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

/// A partition buffer carried between nodes at runtime.
pub type Partition = Box<dyn Any + Send + Sync>;

/// A lightweight runtime type tag for debugging and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>() }
    }
}

/// Type-erased helpers for `Vec<T>`.
///
/// Implementations return `None` when `data` is not the `Vec<T>` they expect.
pub trait VecOps: Send + Sync {
    fn len(&self, data: &dyn Any) -> Option<usize>;

    /// Split into up to `n` contiguous partitions, preserving element order.
    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>>;

    fn clone_any(&self, data: &dyn Any) -> Option<Partition>;
}

pub struct VecOpsImpl<T: Clone + Send + Sync + 'static>(PhantomData<T>);

impl<T: Clone + Send + Sync + 'static> VecOps for VecOpsImpl<T> {
    fn len(&self, data: &dyn Any) -> Option<usize> {
        data.downcast_ref::<Vec<T>>().map(|v| v.len())
    }

    fn split(&self, data: &dyn Any, n: usize) -> Option<Vec<Partition>> {
        let v = data.downcast_ref::<Vec<T>>()?;
        let len = v.len();

        if n <= 1 || len <= 1 {
            return Some(vec![Box::new(v.clone())]);
        }

        let chunk = len.div_ceil(n);
        let parts = v
            .chunks(chunk)
            .map(|c| Box::new(c.to_vec()) as Partition)
            .collect();
        Some(parts)
    }

    fn clone_any(&self, data: &dyn Any) -> Option<Partition> {
        data.downcast_ref::<Vec<T>>()
            .map(|v| Box::new(v.clone()) as Partition)
    }
}

pub fn vec_ops_for<T: Clone + Send + Sync + 'static>() -> Arc<dyn VecOps> {
    Arc::new(VecOpsImpl::<T>(PhantomData))
}

/// Unbox a partition as `T`, reporting the expected type on mismatch.
pub(crate) fn downcast_part<T: 'static>(p: Partition) -> Result<T, FlowError> {
    p.downcast::<T>()
        .map(|b| *b)
        .map_err(|_| FlowError::TypeMismatch { expected: type_name::<T>() })
}

/// Unbox partitions that each hold a `Vec<T>` and concatenate them in order.
pub(crate) fn concat_parts<T: 'static>(parts: Vec<Partition>) -> Result<Vec<T>, FlowError> {
    let mut out = Vec::new();
    for p in parts {
        out.extend(downcast_part::<Vec<T>>(p)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_order_and_total() {
        let ops = vec_ops_for::<u32>();
        let data: Vec<u32> = (0..10).collect();
        let parts = ops.split(&data, 3).unwrap();
        assert_eq!(parts.len(), 3);
        let joined: Vec<u32> = parts
            .into_iter()
            .flat_map(|p| downcast_part::<Vec<u32>>(p).unwrap())
            .collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn wrong_type_is_reported() {
        let ops = vec_ops_for::<u32>();
        let data: Vec<String> = vec!["x".into()];
        assert!(ops.len(&data).is_none());
        let err = downcast_part::<Vec<u32>>(Box::new(data)).unwrap_err();
        assert!(matches!(err, FlowError::TypeMismatch { .. }));
    }
}
