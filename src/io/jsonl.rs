//! JSON Lines files.
//!
//! - [`read_jsonl_vec`] / [`write_jsonl_vec`] for typed vectors.
//! - [`JsonlSource`] reads every file matching a glob as one bounded source.
//!
//! Empty and whitespace-only lines are skipped on read. Paths ending in `.gz`
//! are (de)compressed transparently.

use crate::io::compression::{create_writer, open_reader};
use crate::io::glob::expand_glob_required;
use crate::io::source::BoundedSource;
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{BufRead, Write};
use std::marker::PhantomData;
use std::path::Path;

pub fn read_jsonl_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let rdr = open_reader(path)?;
    let mut out = Vec::<T>::new();
    for (i, line) in rdr.lines().enumerate() {
        let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let v: T = serde_json::from_str(&line)
            .with_context(|| format!("parse JSONL line {} in {}: {}", i + 1, path.display(), line))?;
        out.push(v);
    }
    Ok(out)
}

pub fn write_jsonl_vec<T: Serialize>(path: impl AsRef<Path>, data: &[T]) -> Result<usize> {
    let path = path.as_ref();
    let mut w = create_writer(path)?;
    for (i, item) in data.iter().enumerate() {
        serde_json::to_writer(&mut w, item).with_context(|| format!("serialize item #{} to {}", i, path.display()))?;
        w.write_all(b"\n")?;
    }
    w.finish()?;
    Ok(data.len())
}

/// Typed records from every JSONL file matching a glob pattern.
pub struct JsonlSource<T> {
    pattern: String,
    _t: PhantomData<fn() -> T>,
}

impl<T> JsonlSource<T> {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), _t: PhantomData }
    }
}

impl<T: DeserializeOwned> BoundedSource<T> for JsonlSource<T> {
    fn read_all(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for path in expand_glob_required(&self.pattern)? {
            out.extend(read_jsonl_vec::<T>(&path)?);
        }
        Ok(out)
    }
}
