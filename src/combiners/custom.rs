//! User-supplied combiners built from closures.

use crate::collection::CombineFn;
use crate::error::{FlowError, FlowResult};
use crate::RFBound;
use std::sync::Arc;

type CreateFn<A> = Arc<dyn Fn() -> A + Send + Sync>;
type AddFn<A, V> = Arc<dyn Fn(&mut A, V) + Send + Sync>;
type MergeAccFn<A> = Arc<dyn Fn(&mut A, A) + Send + Sync>;
type ExtractFn<A, O> = Arc<dyn Fn(&A) -> O + Send + Sync>;

/// A combiner assembled from the four contract operations.
///
/// The merge operation is optional at construction. A `CombineFns` without one
/// still works wherever accumulators never meet (fixed windows, a single
/// partition), but any merge it is asked to perform fails with
/// [`FlowError::Invariant`].
///
/// ```
/// use windbeam::*;
///
/// // Average as (sum, count), NaN when empty.
/// let avg = CombineFns::new(
///     || (0.0_f64, 0_u64),
///     |acc: &mut (f64, u64), v: f64| { acc.0 += v; acc.1 += 1; },
///     |acc: &(f64, u64)| if acc.1 == 0 { f64::NAN } else { acc.0 / acc.1 as f64 },
/// )
/// .with_merge(|acc, other| { acc.0 += other.0; acc.1 += other.1; });
/// ```
pub struct CombineFns<V, A, O> {
    create: CreateFn<A>,
    add: AddFn<A, V>,
    merge: Option<MergeAccFn<A>>,
    extract: ExtractFn<A, O>,
}

impl<V, A, O> Clone for CombineFns<V, A, O> {
    fn clone(&self) -> Self {
        Self {
            create: Arc::clone(&self.create),
            add: Arc::clone(&self.add),
            merge: self.merge.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<V, A, O> CombineFns<V, A, O> {
    pub fn new(
        create: impl Fn() -> A + Send + Sync + 'static,
        add: impl Fn(&mut A, V) + Send + Sync + 'static,
        extract: impl Fn(&A) -> O + Send + Sync + 'static,
    ) -> Self {
        Self { create: Arc::new(create), add: Arc::new(add), merge: None, extract: Arc::new(extract) }
    }

    pub fn with_merge(mut self, merge: impl Fn(&mut A, A) + Send + Sync + 'static) -> Self {
        self.merge = Some(Arc::new(merge));
        self
    }

    pub fn is_mergeable(&self) -> bool {
        self.merge.is_some()
    }
}

impl<V: RFBound, O> CombineFns<V, Vec<V>, O> {
    /// Combiner over the whole value list of a group, like `sum` or
    /// `min(sum(values), bound)`. Values are buffered and `f` runs once per group.
    pub fn from_values_fn(f: impl Fn(&[V]) -> O + Send + Sync + 'static) -> Self {
        CombineFns::new(Vec::new, |acc: &mut Vec<V>, v: V| acc.push(v), move |acc: &Vec<V>| f(acc.as_slice()))
            .with_merge(|acc: &mut Vec<V>, mut other: Vec<V>| acc.append(&mut other))
    }
}

impl<V, A, O> CombineFn<V, A, O> for CombineFns<V, A, O>
where
    V: 'static,
    A: 'static,
    O: 'static,
{
    fn create(&self) -> A {
        (self.create)()
    }

    fn add_input(&self, acc: &mut A, v: V) {
        (self.add)(acc, v)
    }

    fn merge(&self, acc: &mut A, other: A) -> FlowResult<()> {
        let merge = self
            .merge
            .as_ref()
            .ok_or_else(|| FlowError::invariant("custom combiner has no merge operation"))?;
        merge(acc, other);
        Ok(())
    }

    fn finish(&self, acc: &A) -> O {
        (self.extract)(acc)
    }
}
