//! Tagged multi-output processing.
//!
//! A processing function returns a finite `Vec<TaggedOutput<O>>` per input
//! element: zero or more values, each addressed to the main output (`tag: None`)
//! or to a named channel. Outputs are assembled into a [`TaggedOutputs`] map
//! only after the whole input has been processed.
//!
//! The tag mode is chosen explicitly with [`OutputTags`]:
//!
//! - **Declared** (`OutputTags::declared(main, tags)`): the channel set is fixed
//!   up front. An emission to any other tag fails with
//!   [`FlowError::UnknownTag`] at assembly, as does looking up a tag that was
//!   never declared. The main output answers both to `None` and to its
//!   declared name.
//! - **Undeclared** (`OutputTags::undeclared()`): every emitted tag becomes a
//!   channel. Looking up a tag nothing was emitted to yields an empty channel.
//!
//! ```
//! use windbeam::*;
//!
//! let p = Pipeline::default();
//! let out = from_vec(&p, vec![1u32, 2, 3, 10])
//!     .par_do_with_outputs(OutputTags::declared("main", ["odd", "even"]), |n: &u32| {
//!         let mut v = vec![TaggedOutput::tagged(if n % 2 == 0 { "even" } else { "odd" }, *n)];
//!         if n % 10 == 0 {
//!             v.push(TaggedOutput::main(*n));
//!         }
//!         v
//!     })
//!     .collect_seq()?;
//! assert_eq!(out.get(Some("even"))?, &[2, 10]);
//! assert_eq!(out.main(), &[10]);
//! # anyhow::Result::<()>::Ok(())
//! ```

use crate::error::{FlowError, FlowResult};
use crate::node::{LocalFn, MergeFn};
use crate::type_token::{downcast_part, Partition};
use crate::{PCollection, RFBound};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Output channel name; `None` is the main output.
pub type Tag = Option<String>;

/// One emitted value and the channel it is addressed to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedOutput<T> {
    pub tag: Tag,
    pub value: T,
}

impl<T> TaggedOutput<T> {
    /// Address `value` to the main output.
    pub fn main(value: T) -> Self {
        Self { tag: None, value }
    }

    /// Address `value` to the channel named `tag`.
    pub fn tagged(tag: impl Into<String>, value: T) -> Self {
        Self { tag: Some(tag.into()), value }
    }
}

/// The channel set of a multi-output transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputTags {
    Declared { main: String, tags: Vec<String> },
    Undeclared,
}

impl OutputTags {
    pub fn declared<S, I>(main: impl Into<String>, tags: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        OutputTags::Declared { main: main.into(), tags: tags.into_iter().map(Into::into).collect() }
    }

    pub fn undeclared() -> Self {
        OutputTags::Undeclared
    }

    pub fn is_declared(&self) -> bool {
        matches!(self, OutputTags::Declared { .. })
    }

    fn declared_names(&self) -> Vec<String> {
        match self {
            OutputTags::Declared { main, tags } => std::iter::once(main.clone()).chain(tags.iter().cloned()).collect(),
            OutputTags::Undeclared => Vec::new(),
        }
    }

    /// Map `tag` to its channel key, rejecting tags outside a declared set.
    /// The declared main name folds into `None`.
    pub fn resolve(&self, tag: Option<&str>) -> FlowResult<Tag> {
        match (self, tag) {
            (_, None) => Ok(None),
            (OutputTags::Undeclared, Some(t)) => Ok(Some(t.to_string())),
            (OutputTags::Declared { main, .. }, Some(t)) if t == main => Ok(None),
            (OutputTags::Declared { tags, .. }, Some(t)) if tags.iter().any(|d| d == t) => Ok(Some(t.to_string())),
            (OutputTags::Declared { .. }, Some(t)) => {
                Err(FlowError::UnknownTag { tag: Some(t.to_string()), declared: self.declared_names() })
            }
        }
    }

    fn canonicalize<T>(&self, mut out: TaggedOutput<T>) -> FlowResult<TaggedOutput<T>> {
        out.tag = self.resolve(out.tag.as_deref())?;
        Ok(out)
    }
}

/// Assembled output channels of a multi-output transform.
#[derive(Clone, Debug)]
pub struct TaggedOutputs<T> {
    tags: OutputTags,
    channels: HashMap<Tag, Vec<T>>,
}

impl<T> TaggedOutputs<T> {
    /// Route every emission to its channel, in emission order.
    ///
    /// In declared mode all declared channels exist (possibly empty) and the
    /// first emission to an undeclared tag fails the whole assembly.
    pub fn assemble<I>(tags: OutputTags, emitted: I) -> FlowResult<Self>
    where
        I: IntoIterator<Item = TaggedOutput<T>>,
    {
        let mut channels: HashMap<Tag, Vec<T>> = HashMap::new();
        if let OutputTags::Declared { tags: declared, .. } = &tags {
            channels.insert(None, Vec::new());
            for t in declared {
                channels.insert(Some(t.clone()), Vec::new());
            }
        }
        for out in emitted {
            let out = tags.canonicalize(out)?;
            channels.entry(out.tag).or_default().push(out.value);
        }
        Ok(Self { tags, channels })
    }

    /// Values emitted to `tag`.
    pub fn get(&self, tag: Option<&str>) -> FlowResult<&[T]> {
        let key = self.tags.resolve(tag)?;
        Ok(self.channels.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Values emitted to the main output.
    pub fn main(&self) -> &[T] {
        self.channels.get(&None).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Move the values of `tag` out, leaving the channel empty.
    pub fn take(&mut self, tag: Option<&str>) -> FlowResult<Vec<T>> {
        let key = self.tags.resolve(tag)?;
        Ok(self.channels.get_mut(&key).map(std::mem::take).unwrap_or_default())
    }

    /// Tags of all channels that exist, sorted with the main output first.
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.channels.keys().cloned().collect();
        tags.sort();
        tags
    }

    pub fn output_tags(&self) -> &OutputTags {
        &self.tags
    }

    pub fn into_map(self) -> HashMap<Tag, Vec<T>> {
        self.channels
    }
}

/// Runs a tagging function over in-memory input and assembles its outputs.
pub struct Dispatcher<I, O, F> {
    tags: OutputTags,
    f: F,
    _m: PhantomData<fn(&I) -> O>,
}

impl<I, O, F> Dispatcher<I, O, F>
where
    F: Fn(&I) -> Vec<TaggedOutput<O>>,
{
    pub fn new(tags: OutputTags, f: F) -> Self {
        Self { tags, f, _m: PhantomData }
    }

    /// Emissions for a single element, unvalidated.
    pub fn process(&self, input: &I) -> Vec<TaggedOutput<O>> {
        (self.f)(input)
    }

    /// Process every element, then assemble the channels.
    pub fn dispatch<It>(&self, inputs: It) -> FlowResult<TaggedOutputs<O>>
    where
        It: IntoIterator<Item = I>,
    {
        let emitted: Vec<TaggedOutput<O>> = inputs.into_iter().flat_map(|i| self.process(&i)).collect();
        TaggedOutputs::assemble(self.tags.clone(), emitted)
    }
}

/// Deferred result of [`PCollection::par_do_with_outputs`].
pub struct MultiOutput<O> {
    tagged: PCollection<TaggedOutput<O>>,
    tags: OutputTags,
}

impl<O: RFBound> MultiOutput<O> {
    pub fn output_tags(&self) -> &OutputTags {
        &self.tags
    }

    /// Raw tagged emissions, before any tag check.
    pub fn tagged(&self) -> PCollection<TaggedOutput<O>> {
        self.tagged.clone()
    }

    /// Emissions with tags checked against the declared set and the main name
    /// folded into `None`; executing it fails with `UnknownTag` on a stray tag.
    fn validated(&self) -> PCollection<TaggedOutput<O>> {
        let tags = self.tags.clone();
        let local: LocalFn = Arc::new(move |p: Partition| -> Result<Partition> {
            let rows = downcast_part::<Vec<TaggedOutput<O>>>(p)?;
            let checked = rows
                .into_iter()
                .map(|o| tags.canonicalize(o))
                .collect::<FlowResult<Vec<_>>>()?;
            Ok(Box::new(checked) as Partition)
        });
        let merge: MergeFn = Arc::new(|parts: Vec<Partition>| -> Result<Partition> {
            let mut all = Vec::new();
            for p in parts {
                all.extend(downcast_part::<Vec<TaggedOutput<O>>>(p)?);
            }
            debug!(emissions = all.len(), "tagged outputs assembled");
            Ok(Box::new(all) as Partition)
        });
        self.tagged.clone().barrier("validate_tags", local, merge)
    }

    /// One channel as a collection for further processing.
    ///
    /// Fails right away for a tag outside a declared set; emissions to
    /// undeclared tags fail the pass that executes the channel.
    pub fn channel(&self, tag: Option<&str>) -> Result<PCollection<O>> {
        let want = self.tags.resolve(tag)?;
        Ok(self
            .validated()
            .filter(move |o: &TaggedOutput<O>| o.tag == want)
            .map(|o: &TaggedOutput<O>| o.value.clone()))
    }

    pub fn collect_seq(self) -> Result<TaggedOutputs<O>> {
        let emitted = self.validated().collect_seq()?;
        Ok(TaggedOutputs::assemble(self.tags, emitted)?)
    }

    pub fn collect_par(self, threads: Option<usize>, partitions: Option<usize>) -> Result<TaggedOutputs<O>> {
        let emitted = self.validated().collect_par(threads, partitions)?;
        Ok(TaggedOutputs::assemble(self.tags, emitted)?)
    }
}

impl<T: RFBound> PCollection<T> {
    /// Process each element into any number of tagged outputs.
    pub fn par_do_with_outputs<O, F>(self, tags: OutputTags, f: F) -> MultiOutput<O>
    where
        O: RFBound,
        F: 'static + Send + Sync + Fn(&T) -> Vec<TaggedOutput<O>>,
    {
        MultiOutput { tagged: self.flat_map(f), tags }
    }

    /// Split into `n` channels named `"0"` to `"n-1"` by the index `f` returns.
    ///
    /// An index `>= n` fails with `UnknownTag` when the outputs are assembled.
    pub fn partition<F>(self, n: usize, f: F) -> MultiOutput<T>
    where
        F: 'static + Send + Sync + Fn(&T, usize) -> usize,
    {
        let tags = OutputTags::declared("main", (0..n).map(|i| i.to_string()));
        self.par_do_with_outputs(tags, move |t: &T| vec![TaggedOutput::tagged(f(t, n).to_string(), t.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<&'static str> {
        vec!["a", "an", "the", "music", "xyz"]
    }

    #[test]
    fn declared_main_answers_to_its_name() {
        let out = TaggedOutputs::assemble(
            OutputTags::declared("main", ["x"]),
            vec![TaggedOutput::tagged("main", 1), TaggedOutput::main(2), TaggedOutput::tagged("x", 3)],
        )
        .unwrap();
        assert_eq!(out.main(), &[1, 2]);
        assert_eq!(out.get(Some("main")).unwrap(), &[1, 2]);
        assert_eq!(out.get(Some("x")).unwrap(), &[3]);
    }

    #[test]
    fn undeclared_emission_fails_assembly() {
        let d = Dispatcher::new(OutputTags::declared("below", ["above"]), |w: &&str| {
            vec![TaggedOutput::tagged(if w.len() > 2 { "above" } else { "marked" }, w.len())]
        });
        let err = d.dispatch(words()).unwrap_err();
        assert!(matches!(err, FlowError::UnknownTag { tag: Some(ref t), .. } if t == "marked"));
    }

    #[test]
    fn undeclared_mode_creates_channels_on_emission() {
        let d = Dispatcher::new(OutputTags::undeclared(), |w: &&str| {
            if w.starts_with('x') { vec![TaggedOutput::tagged("x", w.to_string())] } else { vec![] }
        });
        let out = d.dispatch(words()).unwrap();
        assert_eq!(out.get(Some("x")).unwrap(), &["xyz".to_string()]);
        assert!(out.get(Some("never")).unwrap().is_empty());
        assert!(out.main().is_empty());
        assert_eq!(out.tags(), vec![Some("x".to_string())]);
    }

    #[test]
    fn declared_lookup_of_unknown_tag_fails() {
        let out = TaggedOutputs::<u8>::assemble(OutputTags::declared("main", ["a"]), vec![]).unwrap();
        assert!(out.get(Some("a")).unwrap().is_empty());
        assert!(matches!(out.get(Some("b")), Err(FlowError::UnknownTag { .. })));
    }
}
