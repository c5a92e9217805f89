//! Composite transforms.
//!
//! [`PTransform`] packages a sequence of transforms into one named, reusable
//! stage; [`PCollection::apply`] runs its expansion. Closures of the shape
//! `Fn(PCollection<I>) -> Result<PCollection<O>>` are transforms too.

use crate::{PCollection, RFBound};
use anyhow::Result;

/// A reusable, packaged sequence of transformations.
///
/// Expansion is fallible so a transform can build window functions or read
/// side inputs while it wires itself in.
///
/// # Example: word count
/// ```
/// use windbeam::*;
///
/// struct CountWords;
///
/// impl PTransform<String, (String, u64)> for CountWords {
///     fn expand(&self, input: PCollection<String>) -> anyhow::Result<PCollection<(String, u64)>> {
///         Ok(input.split_words().count_per_element())
///     }
/// }
///
/// let p = Pipeline::default();
/// let counts = from_vec(&p, vec!["a bb ccc bb bb a".to_string()])
///     .apply(&CountWords)?
///     .collect_seq()?;
/// assert_eq!(counts.len(), 3);
/// # anyhow::Result::<()>::Ok(())
/// ```
pub trait PTransform<I: RFBound, O: RFBound>: Send + Sync {
    /// Wire this transform's stages onto `input` and return the result.
    fn expand(&self, input: PCollection<I>) -> Result<PCollection<O>>;
}

impl<I, O, F> PTransform<I, O> for F
where
    I: RFBound,
    O: RFBound,
    F: Fn(PCollection<I>) -> Result<PCollection<O>> + Send + Sync,
{
    fn expand(&self, input: PCollection<I>) -> Result<PCollection<O>> {
        self(input)
    }
}

impl<T: RFBound> PCollection<T> {
    /// Apply a composite transform to this collection.
    pub fn apply<O: RFBound, P>(self, transform: &P) -> Result<PCollection<O>>
    where
        P: PTransform<T, O> + ?Sized,
    {
        transform.expand(self)
    }
}
