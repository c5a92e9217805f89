use crate::io::jsonl::JsonlSource;
use crate::io::sink::JsonlSink;
use crate::io::source::read_source;
use crate::{PCollection, Pipeline, RFBound};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

/// Read every JSONL file matching `pattern` into a typed PCollection<T>.
pub fn read_jsonl<T>(p: &Pipeline, pattern: &str) -> anyhow::Result<PCollection<T>>
where
    T: RFBound + DeserializeOwned,
{
    read_source(p, &JsonlSource::<T>::new(pattern))
}

impl<T: RFBound + Serialize> PCollection<T> {
    /// Execute the pipeline and write the result to a JSONL file.
    /// Returns number of records written.
    pub fn write_jsonl(self, path: impl Into<PathBuf>) -> anyhow::Result<usize> {
        self.write_to(&mut JsonlSink::<T>::new(path))
    }
}
