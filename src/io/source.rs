//! Bounded sources.
//!
//! A [`BoundedSource`] yields its entire content in one read. [`read_source`]
//! performs that read while the pipeline is being built and wraps every
//! failure in [`FlowError::Source`].

use crate::error::FlowError;
use crate::io::compression::open_reader;
use crate::io::glob::{expand_glob, expand_glob_required, is_glob_pattern};
use crate::{from_vec, PCollection, Pipeline, RFBound};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::debug;

/// A finite input read in full.
pub trait BoundedSource<T>: Send + Sync {
    fn read_all(&self) -> Result<Vec<T>>;
}

/// Lines of every file matching a glob pattern, files in path order.
///
/// Files ending in `.gz` (or starting with the gzip magic bytes) are
/// decompressed on the fly. Line terminators are stripped.
#[derive(Clone, Debug)]
pub struct TextSource {
    pattern: String,
    allow_empty: bool,
}

impl TextSource {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), allow_empty: false }
    }

    /// Accept a wildcard pattern that matches no files.
    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        if self.allow_empty && is_glob_pattern(&self.pattern) {
            expand_glob(&self.pattern)
        } else {
            expand_glob_required(&self.pattern)
        }
    }
}

impl BoundedSource<String> for TextSource {
    fn read_all(&self) -> Result<Vec<String>> {
        let files = self.files()?;
        let mut out = Vec::new();
        for path in &files {
            let reader = open_reader(path)?;
            for (i, line) in reader.lines().enumerate() {
                let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
                out.push(line);
            }
        }
        debug!(pattern = %self.pattern, files = files.len(), lines = out.len(), "text source read");
        Ok(out)
    }
}

/// In-memory source; mostly useful in tests.
impl<T: RFBound> BoundedSource<T> for Vec<T> {
    fn read_all(&self) -> Result<Vec<T>> {
        Ok(self.clone())
    }
}

/// Read `src` and attach its content as a new root collection.
pub fn read_source<T, S>(p: &Pipeline, src: &S) -> Result<PCollection<T>>
where
    T: RFBound,
    S: BoundedSource<T> + ?Sized,
{
    let data = src.read_all().map_err(FlowError::Source)?;
    Ok(from_vec(p, data))
}

/// Shorthand for `read_source(p, &TextSource::new(pattern))`.
pub fn read_text(p: &Pipeline, pattern: &str) -> Result<PCollection<String>> {
    read_source(p, &TextSource::new(pattern))
}
