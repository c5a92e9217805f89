//! Scoped sinks.
//!
//! A [`Sink`] is opened once, written element by element and closed once.
//! [`SinkScope`] ties that lifecycle to a value: it opens the sink when it is
//! created and closes it on every exit path, either through
//! [`finish`](SinkScope::finish), which reports close errors, or on drop.
//!
//! [`PCollection::write_to`] runs the pipeline and streams the result through a
//! scope; any failure there is reported as [`FlowError::Sink`].

use crate::error::FlowError;
use crate::io::coder::{Coder, CoderRegistry};
use crate::io::compression::{create_writer, open_reader, FileWriter};
use crate::{PCollection, RFBound};
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::io::{Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Destination for the elements of a finished pass.
pub trait Sink<T>: Send {
    fn open(&mut self) -> Result<()>;
    fn write(&mut self, value: &T) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Open-on-create, close-on-exit guard around a [`Sink`].
pub struct SinkScope<'a, T, S: Sink<T> + ?Sized> {
    sink: &'a mut S,
    closed: bool,
    written: usize,
    _t: PhantomData<fn(&T)>,
}

impl<'a, T, S: Sink<T> + ?Sized> SinkScope<'a, T, S> {
    pub fn open(sink: &'a mut S) -> Result<Self> {
        sink.open()?;
        Ok(Self { sink, closed: false, written: 0, _t: PhantomData })
    }

    pub fn write(&mut self, value: &T) -> Result<()> {
        self.sink.write(value)?;
        self.written += 1;
        Ok(())
    }

    /// Close the sink and return the number of elements written.
    pub fn finish(mut self) -> Result<usize> {
        self.closed = true;
        self.sink.close()?;
        Ok(self.written)
    }
}

impl<T, S: Sink<T> + ?Sized> Drop for SinkScope<'_, T, S> {
    fn drop(&mut self) {
        if !self.closed
            && let Err(e) = self.sink.close()
        {
            warn!(error = %e, "closing sink after an aborted write failed");
        }
    }
}

/// Write all of `values` through a [`SinkScope`].
pub fn write_all<T, S>(sink: &mut S, values: &[T]) -> Result<usize>
where
    S: Sink<T> + ?Sized,
{
    let mut scope = SinkScope::open(sink)?;
    for v in values {
        scope.write(v)?;
    }
    scope.finish()
}

fn not_open(path: &Path) -> anyhow::Error {
    anyhow!("sink for {} written before open", path.display())
}

fn close_writer(w: &mut Option<FileWriter>) -> Result<()> {
    match w.take() {
        Some(w) => w.finish(),
        None => Ok(()),
    }
}

/// One `Display`ed element per line.
pub struct TextSink<T> {
    path: PathBuf,
    out: Option<FileWriter>,
    _t: PhantomData<fn(&T)>,
}

impl<T> TextSink<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), out: None, _t: PhantomData }
    }
}

impl<T: Display> Sink<T> for TextSink<T> {
    fn open(&mut self) -> Result<()> {
        self.out = Some(create_writer(&self.path)?);
        Ok(())
    }

    fn write(&mut self, value: &T) -> Result<()> {
        let out = self.out.as_mut().ok_or_else(|| not_open(&self.path))?;
        writeln!(out, "{value}").with_context(|| format!("write {}", self.path.display()))
    }

    fn close(&mut self) -> Result<()> {
        close_writer(&mut self.out)
    }
}

/// One JSON document per line.
#[cfg(feature = "io-jsonl")]
pub struct JsonlSink<T> {
    path: PathBuf,
    out: Option<FileWriter>,
    _t: PhantomData<fn(&T)>,
}

#[cfg(feature = "io-jsonl")]
impl<T> JsonlSink<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), out: None, _t: PhantomData }
    }
}

#[cfg(feature = "io-jsonl")]
impl<T: Serialize> Sink<T> for JsonlSink<T> {
    fn open(&mut self) -> Result<()> {
        self.out = Some(create_writer(&self.path)?);
        Ok(())
    }

    fn write(&mut self, value: &T) -> Result<()> {
        let out = self.out.as_mut().ok_or_else(|| not_open(&self.path))?;
        serde_json::to_writer(&mut *out, value).with_context(|| format!("serialize into {}", self.path.display()))?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        close_writer(&mut self.out)
    }
}

/// Length-prefixed records encoded with a [`Coder`]: a big-endian `u32`
/// byte count followed by the encoded bytes.
pub struct EncodedSink<T> {
    path: PathBuf,
    coder: Arc<dyn Coder<T>>,
    out: Option<FileWriter>,
}

impl<T> EncodedSink<T> {
    pub fn new(path: impl Into<PathBuf>, coder: Arc<dyn Coder<T>>) -> Self {
        Self { path: path.into(), coder, out: None }
    }

    /// Use the coder `registry` holds for `T`.
    pub fn from_registry(path: impl Into<PathBuf>, registry: &CoderRegistry) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        Self::new(path, registry.coder_for::<T>())
    }
}

impl<T> Sink<T> for EncodedSink<T> {
    fn open(&mut self) -> Result<()> {
        self.out = Some(create_writer(&self.path)?);
        Ok(())
    }

    fn write(&mut self, value: &T) -> Result<()> {
        let bytes = self.coder.encode(value)?;
        let len = u32::try_from(bytes.len()).context("encoded record larger than 4 GiB")?;
        let out = self.out.as_mut().ok_or_else(|| not_open(&self.path))?;
        out.write_all(&len.to_be_bytes())?;
        out.write_all(&bytes)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        close_writer(&mut self.out)
    }
}

/// Read back a file written by [`EncodedSink`].
///
/// Record buffers grow with the bytes actually present, so a corrupt length
/// prefix fails as a truncated record instead of allocating up front.
pub fn read_encoded<T>(path: impl AsRef<Path>, coder: &dyn Coder<T>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let mut r = open_reader(path)?;
    let mut out = Vec::new();
    loop {
        let mut len = [0u8; 4];
        match r.read_exact(&mut len) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        }
        let want = u64::from(u32::from_be_bytes(len));
        let mut buf = Vec::new();
        r.by_ref()
            .take(want)
            .read_to_end(&mut buf)
            .with_context(|| format!("read record #{} in {}", out.len(), path.display()))?;
        if buf.len() as u64 != want {
            bail!("truncated record #{} in {}: header says {want} bytes, found {}", out.len(), path.display(), buf.len());
        }
        out.push(coder.decode(&buf)?);
    }
    Ok(out)
}

impl<T: RFBound> PCollection<T> {
    /// Run the pipeline sequentially and write the result to `sink`.
    /// Returns the number of elements written.
    pub fn write_to<S>(self, sink: &mut S) -> Result<usize>
    where
        S: Sink<T> + ?Sized,
    {
        let values = self.collect_seq()?;
        let n = write_all(sink, &values).map_err(FlowError::Sink)?;
        debug!(elements = n, "sink closed");
        Ok(n)
    }

    /// Like [`write_to`](Self::write_to), executing in parallel first.
    #[cfg(feature = "parallel-io")]
    pub fn write_to_par<S>(self, sink: &mut S, threads: Option<usize>) -> Result<usize>
    where
        S: Sink<T> + ?Sized,
    {
        let values = self.collect_par(threads, None)?;
        let n = write_all(sink, &values).map_err(FlowError::Sink)?;
        debug!(elements = n, "sink closed");
        Ok(n)
    }
}
