//! The I/O boundary: bounded sources, scoped sinks and coders.

pub mod coder;
pub mod compression;
pub mod glob;
pub mod sink;
pub mod source;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;
