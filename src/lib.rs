//! # windbeam
//!
//! A bounded, Beam-style dataflow core: typed elements with event timestamps,
//! window assignment (fixed, sliding, session, global), per-key and per-window
//! grouping with session merging, an associative combiner contract, and tagged
//! multi-output processing.
//!
//! ## Quick Start
//!
//! ```
//! use windbeam::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let p = Pipeline::default();
//!
//! // Word count
//! let counts = from_vec(&p, vec!["a bb ccc bb bb a".to_string()])
//!     .split_words()
//!     .count_per_element()
//!     .collect_seq()?;
//!
//! // Per-key sums in one-minute windows
//! let sums = from_vec(&p, vec![
//!     ("k", Timestamped::new(10, 50u32)),
//!     ("k", Timestamped::new(30, 60)),
//!     ("k", Timestamped::new(70, 215)),
//! ])
//! .window_into(WindowFn::fixed(60)?)
//! .combine_per_key_and_window(Sum::<u32>::new())
//! .collect_seq()?;
//!
//! assert_eq!(counts.len(), 3);
//! assert_eq!(sums.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Pipeline and PCollection
//!
//! A [`Pipeline`] holds a deferred graph. A [`PCollection<T>`] is a typed
//! handle to one node of it, plus the [`WindowFn`] later grouping transforms
//! use. Nothing runs until a collect method is called:
//! [`collect_seq`](PCollection::collect_seq) runs in one partition on the
//! calling thread, [`collect_par`](PCollection::collect_par) splits the source
//! and runs partitions on a rayon pool. Both give the same multiset of results.
//!
//! ### Windows
//!
//! Elements carry an event time ([`Timestamped<T>`]). A [`WindowFn`] assigns
//! each timestamp to half-open [`Window`]s; session windows of the same key
//! that overlap or touch are merged while grouping.
//!
//! ### Combiners
//!
//! A [`CombineFn`] reduces values through a mergeable accumulator. Built-ins
//! live in [`combiners`]; [`CombineFns`] builds one from closures and
//! [`NumericCombiner`] selects one from configuration.
//!
//! ### Tagged outputs
//!
//! [`par_do_with_outputs`](PCollection::par_do_with_outputs) lets one function
//! emit to several named channels, either a declared set checked at assembly
//! or any tag at all (see [`OutputTags`]).
//!
//! ### Errors
//!
//! Entry points return [`anyhow::Result`]; typed failures are [`FlowError`]s
//! reachable through `downcast_ref`.

pub mod collection;
pub mod combiners;
pub mod config;
pub mod error;
pub mod extensions;
pub mod grouping;
pub mod helpers;
pub mod io;
pub mod node;
pub mod node_id;
pub mod outputs;
pub mod pipeline;
pub mod runner;
pub mod testing;
pub mod type_token;
pub mod window;
pub mod windowing;

pub use collection::{CombineFn, LiftableCombiner, PCollection, RFBound};
pub use combiners::{CombineFns, Count, Max, Mean, Min, NumericCombiner, Sum, ToList};
pub use config::PipelineConfig;
pub use error::{FlowError, FlowResult};
pub use extensions::PTransform;
pub use grouping::GroupingEngine;
pub use helpers::*;
pub use io::coder::{Coder, CoderRegistry, JsonCoder};
pub use io::sink::{EncodedSink, Sink, SinkScope, TextSink};
pub use io::source::{read_source, read_text, BoundedSource, TextSource};
pub use node_id::NodeId;
pub use outputs::{Dispatcher, MultiOutput, OutputTags, Tag, TaggedOutput, TaggedOutputs};
pub use pipeline::Pipeline;
pub use runner::{ExecMode, Runner};
pub use type_token::Partition;
pub use window::{TimestampMs, Timestamped, Window};
pub use windowing::WindowFn;

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{read_jsonl_vec, write_jsonl_vec, JsonlSource};
#[cfg(feature = "io-jsonl")]
pub use io::sink::JsonlSink;
